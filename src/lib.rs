// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! AirSafe gas monitor library
//!
//! Samples an MQ-2 style gas sensor and a DHT11 climate sensor, estimates the
//! gas concentration from a calibrated log-linear model, drives three alarm
//! indicators and periodically reports the readings to a remote collector.

pub mod config;
pub mod gas_model;
pub mod hardware;
pub mod monitor;
pub mod reporter;
