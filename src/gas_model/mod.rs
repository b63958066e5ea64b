// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Electrochemical gas sensor model
//!
//! This module converts raw readings of an MQ-2 style metal-oxide sensor into a
//! gas concentration estimate. The sensor sits in a voltage divider with a load
//! resistor; its resistance drops as the target gas concentration rises.
//!
//! ## Model
//!
//! ```text
//! raw ADC ──► Vout ──► Rs = (Vc - Vout) · RL / Vout ──► Rs/Ro ──► ppm
//! ```
//!
//! The last step uses a per-gas log-linear curve fit taken from the sensor
//! datasheet:
//!
//! ```text
//! log10(Rs/Ro) = slope · log10(ppm) + intercept
//! ```
//!
//! `Ro` is the clean-air baseline resistance, established once per run by
//! [`calibrate`].

mod calibration;

pub use calibration::{calibrate, CalibrationBaseline, CalibrationError};

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rs/Ro ratio of the sensor in clean air
pub const CLEAN_AIR_RATIO: f64 = 9.8;

/// Largest raw value produced by the 10-bit converter
pub const ADC_MAX_RAW: u16 = 1023;

/// Upper bound of the concentration estimate, in ppm
pub const MAX_PPM: f64 = 1e6;

/// Errors raised by the gas model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GasModelError {
    #[error("Vout is 0, check the sensor or connections")]
    DivisionByZero,

    #[error("Rs/Ro ratio {ratio} is invalid, check the sensor readings")]
    InvalidInput { ratio: f64 },

    #[error("Gas type '{name}' not supported, choose from: LPG, Methane, Hydrogen, Alcohol")]
    InvalidGasType { name: String },

    #[error("ADC value {raw} out of range, check your hardware or connections")]
    SampleOutOfRange { raw: u16 },
}

/// Gas species with a known curve fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gas {
    #[serde(rename = "LPG")]
    Lpg,
    Methane,
    Hydrogen,
    Alcohol,
}

/// Log-linear curve fit of a gas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit {
    pub slope: f64,
    pub intercept: f64,
}

impl Gas {
    pub const ALL: [Gas; 4] = [Gas::Lpg, Gas::Methane, Gas::Hydrogen, Gas::Alcohol];

    /// Curve fit (slope, intercept) for this gas
    pub fn curve(self) -> CurveFit {
        let (slope, intercept) = match self {
            Gas::Lpg => (-0.47, 1.7),
            Gas::Methane => (-0.38, 1.3),
            Gas::Hydrogen => (-0.35, 1.1),
            Gas::Alcohol => (-0.30, 0.8),
        };
        CurveFit { slope, intercept }
    }

    /// Name used in configuration files and logs
    pub fn name(self) -> &'static str {
        match self {
            Gas::Lpg => "LPG",
            Gas::Methane => "Methane",
            Gas::Hydrogen => "Hydrogen",
            Gas::Alcohol => "Alcohol",
        }
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gas {
    type Err = GasModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gas::ALL
            .into_iter()
            .find(|gas| gas.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GasModelError::InvalidGasType {
                name: s.to_string(),
            })
    }
}

/// Electrical parameters of the sensor circuit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCircuit {
    /// Load resistance RL in kΩ
    pub load_resistance: f64,
    /// Voltage feeding the divider (Vc)
    pub supply_voltage: f64,
    /// Full-scale voltage of the converter
    pub adc_reference: f64,
}

impl Default for SensorCircuit {
    fn default() -> Self {
        Self {
            load_resistance: 10.0,
            supply_voltage: 5.0,
            adc_reference: 3.3,
        }
    }
}

/// A digitised gas sensor reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub raw: u16,
    pub voltage: f64,
}

impl SensorSample {
    /// Validate a raw converter value and derive its voltage.
    ///
    /// Fails on values above [`ADC_MAX_RAW`] and on a zero voltage, both of
    /// which point at a wiring fault.
    pub fn from_raw(raw: u16, adc_reference: f64) -> Result<Self, GasModelError> {
        if raw > ADC_MAX_RAW {
            return Err(GasModelError::SampleOutOfRange { raw });
        }
        let voltage = f64::from(raw) * adc_reference / f64::from(ADC_MAX_RAW);
        if voltage == 0.0 {
            return Err(GasModelError::DivisionByZero);
        }
        Ok(Self { raw, voltage })
    }
}

impl SensorCircuit {
    /// Sensor resistance (kΩ) for a validated sample
    pub fn resistance(&self, sample: &SensorSample) -> Result<f64, GasModelError> {
        resistance_from_voltage(sample.voltage, self.load_resistance, self.supply_voltage)
    }
}

/// Sensor resistance from the divider output voltage.
///
/// `Rs = (Vc - Vout) · RL / Vout`
pub fn resistance_from_voltage(
    vout: f64,
    load_resistance: f64,
    supply_voltage: f64,
) -> Result<f64, GasModelError> {
    if vout == 0.0 {
        return Err(GasModelError::DivisionByZero);
    }
    Ok((supply_voltage - vout) * load_resistance / vout)
}

/// Concentration (ppm) of `gas` for a given Rs/Ro ratio.
///
/// The result is clamped to `[0, MAX_PPM]`; a clamp at the upper bound is
/// logged as a saturation warning. A non-positive ratio has no logarithm and
/// is rejected.
pub fn concentration_ppm(resistance_ratio: f64, gas: Gas) -> Result<f64, GasModelError> {
    if !resistance_ratio.is_finite() || resistance_ratio <= 0.0 {
        return Err(GasModelError::InvalidInput {
            ratio: resistance_ratio,
        });
    }

    let CurveFit { slope, intercept } = gas.curve();
    let log_ppm = (resistance_ratio.log10() - intercept) / slope;
    let ppm = 10f64.powf(log_ppm);

    if ppm > MAX_PPM {
        warn!(
            "{} concentration {:.3e} ppm exceeds maximum readable range, set to {:.0e}",
            gas, ppm, MAX_PPM
        );
        return Ok(MAX_PPM);
    }

    Ok(ppm.max(0.0))
}

/// Same as [`concentration_ppm`], with the gas given by name
pub fn concentration_ppm_named(resistance_ratio: f64, gas: &str) -> Result<f64, GasModelError> {
    concentration_ppm(resistance_ratio, gas.parse()?)
}

/// Every intermediate value of one estimation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub sample: SensorSample,
    pub resistance: f64,
    pub ratio: f64,
    pub ppm: f64,
}

/// Calibrated sensor: circuit, baseline and target gas
#[derive(Debug, Clone, Copy)]
pub struct GasSensorModel {
    pub circuit: SensorCircuit,
    pub baseline: CalibrationBaseline,
    pub gas: Gas,
}

impl GasSensorModel {
    pub fn new(circuit: SensorCircuit, baseline: CalibrationBaseline, gas: Gas) -> Self {
        Self {
            circuit,
            baseline,
            gas,
        }
    }

    /// Run a raw converter value through the full model
    pub fn estimate(&self, raw: u16) -> Result<Estimate, GasModelError> {
        let sample = SensorSample::from_raw(raw, self.circuit.adc_reference)?;
        let resistance = self.circuit.resistance(&sample)?;
        let ratio = resistance / self.baseline.resistance();
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(GasModelError::InvalidInput { ratio });
        }
        let ppm = concentration_ppm(ratio, self.gas)?;

        Ok(Estimate {
            sample,
            resistance,
            ratio,
            ppm,
        })
    }
}
