// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Alarm thresholds and indicator wiring

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Concentration bands and indicator outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Lower bound of the Warning band in ppm
    #[serde(default = "default_warning")]
    pub warning_ppm: f64,

    /// Lower bound of the Danger band in ppm
    #[serde(default = "default_danger")]
    pub danger_ppm: f64,

    /// Lower bound of the Critical band in ppm
    #[serde(default = "default_critical")]
    pub critical_ppm: f64,

    /// Half period of the Critical blink (on time = off time) in milliseconds
    #[serde(default = "default_blink_period")]
    pub blink_period_ms: u64,

    /// GPIO numbers of the indicators (BCM numbering)
    #[serde(default)]
    pub pins: IndicatorPins,
}

/// GPIO numbers of the three indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPins {
    pub green: u8,
    pub yellow: u8,
    pub red: u8,
}

impl Default for IndicatorPins {
    fn default() -> Self {
        Self {
            green: 17,
            yellow: 27,
            red: 22,
        }
    }
}

impl IndicatorPins {
    pub fn all(&self) -> [u8; 3] {
        [self.green, self.yellow, self.red]
    }
}

fn default_warning() -> f64 {
    50.0
}

fn default_danger() -> f64 {
    100.0
}

fn default_critical() -> f64 {
    200.0
}

fn default_blink_period() -> u64 {
    200
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            warning_ppm: default_warning(),
            danger_ppm: default_danger(),
            critical_ppm: default_critical(),
            blink_period_ms: default_blink_period(),
            pins: IndicatorPins::default(),
        }
    }
}

impl AlarmConfig {
    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }
}
