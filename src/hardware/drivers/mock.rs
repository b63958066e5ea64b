// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Scripted hardware doubles
//!
//! Each double replays a script of values and keeps a record of what the
//! monitor asked of it, so tests can drive the control loop deterministically.
//! Once a script is exhausted its last entry repeats.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::hardware::{
    check_channel, AnalogBus, ClimateReadFault, ClimateReading, ClimateSensor, DigitalOutput,
    HardwareError,
};

/// Scripted analog converter
#[derive(Debug, Default)]
pub struct MockAnalogBus {
    script: Mutex<VecDeque<Result<u16, HardwareError>>>,
    last: Mutex<Option<Result<u16, HardwareError>>>,
    reads: AtomicUsize,
    released: AtomicBool,
}

impl MockAnalogBus {
    /// Bus answering `raw` forever
    pub fn constant(raw: u16) -> Self {
        Self::from_samples(vec![raw])
    }

    /// Bus replaying `samples`, then repeating the last one
    pub fn from_samples(samples: Vec<u16>) -> Self {
        Self::from_script(samples.into_iter().map(Ok).collect())
    }

    pub fn from_script(script: Vec<Result<u16, HardwareError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Append samples to the script
    pub fn push_samples(&self, samples: &[u16]) {
        if let Ok(mut script) = self.script.lock() {
            script.extend(samples.iter().copied().map(Ok));
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalogBus for MockAnalogBus {
    async fn read_channel(&self, channel: u8) -> Result<u16, HardwareError> {
        check_channel(channel)?;
        self.reads.fetch_add(1, Ordering::SeqCst);

        let next = self
            .script
            .lock()
            .map_err(|e| HardwareError::Bus(e.to_string()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|e| HardwareError::Bus(e.to_string()))?;
        if let Some(value) = next {
            *last = Some(value);
        }
        (*last)
            .clone()
            .unwrap_or_else(|| Err(HardwareError::Bus("empty mock script".to_string())))
    }

    async fn release(&self) -> Result<(), HardwareError> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Indicator outputs recording every write
#[derive(Debug, Default)]
pub struct MockOutputs {
    states: Mutex<HashMap<u8, bool>>,
    history: Mutex<Vec<(u8, bool)>>,
    releases: AtomicUsize,
}

impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of `pin` (low if never written)
    pub fn state(&self, pin: u8) -> bool {
        self.states
            .lock()
            .map(|states| states.get(&pin).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Every `(pin, level)` write in order
    pub fn history(&self) -> Vec<(u8, bool)> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Number of times `pin` was driven high
    pub fn times_set_high(&self, pin: u8) -> usize {
        self.history()
            .into_iter()
            .filter(|&(p, on)| p == pin && on)
            .count()
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DigitalOutput for MockOutputs {
    async fn set(&self, pin: u8, on: bool) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(pin, on);
        }
        if let Ok(mut history) = self.history.lock() {
            history.push((pin, on));
        }
    }

    async fn release(&self) -> Result<(), HardwareError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted climate sensor
#[derive(Debug, Default)]
pub struct MockClimateSensor {
    script: Mutex<VecDeque<Result<ClimateReading, ClimateReadFault>>>,
    last: Mutex<Option<Result<ClimateReading, ClimateReadFault>>>,
    reads: AtomicUsize,
}

impl MockClimateSensor {
    /// Sensor answering the same reading forever
    pub fn constant(temperature: f32, humidity: f32) -> Self {
        Self::from_script(vec![Ok(ClimateReading {
            temperature,
            humidity,
        })])
    }

    /// Sensor that never answers
    pub fn failing() -> Self {
        Self::from_script(vec![Err(ClimateReadFault::Timeout)])
    }

    pub fn from_script(script: Vec<Result<ClimateReading, ClimateReadFault>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClimateSensor for MockClimateSensor {
    async fn read(&self) -> Result<ClimateReading, ClimateReadFault> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let next = self
            .script
            .lock()
            .map_err(|e| ClimateReadFault::Unavailable(e.to_string()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|e| ClimateReadFault::Unavailable(e.to_string()))?;
        if let Some(value) = next {
            *last = Some(value);
        }
        (*last).clone().unwrap_or(Err(ClimateReadFault::Timeout))
    }
}
