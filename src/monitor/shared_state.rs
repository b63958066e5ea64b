// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared readings snapshot
//!
//! The sampling loop writes the latest temperature, humidity and
//! concentration here; the reporter takes copies. Every access goes through a
//! single mutex and nothing is awaited while it is held.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// Latest known value of every measurement.
///
/// A field is `None` until its first successful read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Readings {
    /// Temperature in °C
    pub temperature: Option<f32>,
    /// Relative humidity in %RH
    pub humidity: Option<f32>,
    /// Gas concentration in ppm
    pub concentration: Option<f64>,
}

impl Readings {
    /// True once every field has been written at least once
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some() && self.concentration.is_some()
    }
}

/// One field update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingUpdate {
    Temperature(f32),
    Humidity(f32),
    Concentration(f64),
}

impl ReadingUpdate {
    fn apply(self, readings: &mut Readings) {
        match self {
            ReadingUpdate::Temperature(value) => readings.temperature = Some(value),
            ReadingUpdate::Humidity(value) => readings.humidity = Some(value),
            ReadingUpdate::Concentration(value) => readings.concentration = Some(value),
        }
    }
}

/// Lock-guarded [`Readings`], cheap to clone and share between tasks
#[derive(Debug, Clone, Default)]
pub struct ReadingsStore {
    inner: Arc<Mutex<Readings>>,
}

impl ReadingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single field
    pub async fn update(&self, update: ReadingUpdate) {
        let mut readings = self.inner.lock().await;
        update.apply(&mut readings);
    }

    /// Write several fields under one lock acquisition, so readers see all or none of them
    pub async fn update_all(&self, updates: &[ReadingUpdate]) {
        let mut readings = self.inner.lock().await;
        for update in updates {
            update.apply(&mut readings);
        }
    }

    /// Copy of the current readings
    pub async fn snapshot(&self) -> Readings {
        *self.inner.lock().await
    }
}
