// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sampling loop cadence configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gas and climate read cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Delay between two gas sensor reads in milliseconds
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Minimum time between two climate sensor read attempts in milliseconds.
    /// The DHT11 cannot be read faster than every 2 seconds.
    #[serde(default = "default_climate_interval")]
    pub climate_interval_ms: u64,
}

fn default_interval() -> u64 {
    500
}

fn default_climate_interval() -> u64 {
    2000
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            climate_interval_ms: default_climate_interval(),
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn climate_interval(&self) -> Duration {
        Duration::from_millis(self.climate_interval_ms)
    }
}
