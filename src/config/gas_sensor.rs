// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Gas sensor configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gas_model::{Gas, SensorCircuit};

/// Gas sensor circuit, target gas and calibration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSensorConfig {
    /// Converter channel the sensor is wired to (0-7)
    #[serde(default)]
    pub channel: u8,

    /// Gas species to estimate
    #[serde(default = "default_gas")]
    pub gas: Gas,

    /// Load resistance RL in kΩ
    #[serde(default = "default_load_resistance")]
    pub load_resistance_kohm: f64,

    /// Voltage feeding the sensor divider
    #[serde(default = "default_supply_voltage")]
    pub supply_voltage: f64,

    /// Full-scale voltage of the converter
    #[serde(default = "default_adc_reference")]
    pub adc_reference_voltage: f64,

    /// Number of clean-air samples averaged by the calibration pass
    #[serde(default = "default_calibration_samples")]
    pub calibration_samples: usize,

    /// Delay between calibration samples in milliseconds
    #[serde(default = "default_calibration_delay")]
    pub calibration_delay_ms: u64,
}

fn default_gas() -> Gas {
    Gas::Lpg
}

fn default_load_resistance() -> f64 {
    10.0
}

fn default_supply_voltage() -> f64 {
    5.0
}

fn default_adc_reference() -> f64 {
    3.3
}

fn default_calibration_samples() -> usize {
    50
}

fn default_calibration_delay() -> u64 {
    500
}

impl Default for GasSensorConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            gas: default_gas(),
            load_resistance_kohm: default_load_resistance(),
            supply_voltage: default_supply_voltage(),
            adc_reference_voltage: default_adc_reference(),
            calibration_samples: default_calibration_samples(),
            calibration_delay_ms: default_calibration_delay(),
        }
    }
}

impl GasSensorConfig {
    pub fn circuit(&self) -> SensorCircuit {
        SensorCircuit {
            load_resistance: self.load_resistance_kohm,
            supply_voltage: self.supply_voltage,
            adc_reference: self.adc_reference_voltage,
        }
    }

    pub fn calibration_delay(&self) -> Duration {
        Duration::from_millis(self.calibration_delay_ms)
    }
}
