// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hardware drivers for the monitor
//!
//! This module provides different driver implementations:
//! - Native: MCP3008 over SPI, sysfs GPIO and the IIO DHT11 driver on a Raspberry Pi
//! - Simulated: synthetic gas leaks and climate readings for development
//! - Mock: scripted doubles for testing

pub mod mock;
#[cfg(feature = "native")]
pub mod native;
pub mod simulated;

pub use mock::{MockAnalogBus, MockClimateSensor, MockOutputs};
pub use simulated::{SimulatedAnalogBus, SimulatedClimateSensor, SimulatedOutputs};
