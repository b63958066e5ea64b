// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Clean-air calibration of the gas sensor

use std::time::Duration;

use log::{debug, error, info};
use thiserror::Error;

use super::{GasModelError, SensorCircuit, SensorSample, CLEAN_AIR_RATIO};
use crate::hardware::{AnalogBus, HardwareError};

/// Clean-air baseline resistance Ro, in kΩ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBaseline(f64);

impl CalibrationBaseline {
    pub fn new(resistance_kohm: f64) -> Self {
        Self(resistance_kohm)
    }

    pub fn resistance(&self) -> f64 {
        self.0
    }
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Calibration needs at least one sample")]
    NoSamples,

    #[error("Calibration gave an unusable baseline Ro = {resistance} kΩ")]
    InvalidBaseline { resistance: f64 },

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Model(#[from] GasModelError),
}

/// Establish the clean-air baseline resistance Ro.
///
/// Reads `sample_count` samples from `channel`, waiting `delay` after each,
/// and returns the mean sensor resistance divided by [`CLEAN_AIR_RATIO`].
/// Any out-of-range or zero-voltage sample aborts the calibration, and so
/// does a baseline that is not a positive finite resistance.
pub async fn calibrate(
    bus: &dyn AnalogBus,
    channel: u8,
    circuit: &SensorCircuit,
    sample_count: usize,
    delay: Duration,
) -> Result<CalibrationBaseline, CalibrationError> {
    if sample_count == 0 {
        return Err(CalibrationError::NoSamples);
    }

    info!(
        "Calibrating gas sensor in clean air ({} samples, {:?} apart). Please ensure the sensor is in clean air...",
        sample_count, delay
    );

    let mut rs_sum = 0.0;
    for index in 0..sample_count {
        let raw = bus.read_channel(channel).await?;
        let sample = SensorSample::from_raw(raw, circuit.adc_reference)?;
        let rs = circuit.resistance(&sample)?;
        debug!(
            "Calibration sample {}/{}: ADC {} | Vout {:.3} V | Rs {:.3} kΩ",
            index + 1,
            sample_count,
            raw,
            sample.voltage,
            rs
        );
        rs_sum += rs;

        tokio::time::sleep(delay).await;
    }

    let rs_avg = rs_sum / sample_count as f64;
    let ro = rs_avg / CLEAN_AIR_RATIO;
    if !ro.is_finite() || ro <= 0.0 {
        error!("Calibration failed: Ro = {} kΩ", ro);
        return Err(CalibrationError::InvalidBaseline { resistance: ro });
    }
    let baseline = CalibrationBaseline::new(ro);
    info!("Calibration complete. Ro = {:.2} kΩ", baseline.resistance());
    Ok(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::drivers::mock::MockAnalogBus;
    use approx::assert_relative_eq;

    #[tokio::test]
    async fn test_calibrate_constant_samples() {
        let bus = MockAnalogBus::constant(512);
        let baseline = calibrate(&bus, 0, &SensorCircuit::default(), 50, Duration::ZERO)
            .await
            .unwrap();

        let vout = 512.0 * 3.3 / 1023.0;
        let expected = (5.0 - vout) * 10.0 / vout / 9.8;
        assert_relative_eq!(baseline.resistance(), expected, max_relative = 1e-12);
        assert_eq!(bus.reads(), 50);
    }

    #[tokio::test]
    async fn test_calibrate_averages_resistance() {
        let bus = MockAnalogBus::from_samples(vec![300, 600]);
        let circuit = SensorCircuit::default();
        let baseline = calibrate(&bus, 0, &circuit, 2, Duration::ZERO)
            .await
            .unwrap();

        let rs = |raw: f64| {
            let v = raw * 3.3 / 1023.0;
            (5.0 - v) * 10.0 / v
        };
        let expected = (rs(300.0) + rs(600.0)) / 2.0 / 9.8;
        assert_relative_eq!(baseline.resistance(), expected, max_relative = 1e-12);
    }

    #[tokio::test]
    async fn test_calibrate_rejects_bad_samples() {
        let bus = MockAnalogBus::from_samples(vec![512, 0]);
        let err = calibrate(&bus, 0, &SensorCircuit::default(), 5, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Model(GasModelError::DivisionByZero)
        ));

        let bus = MockAnalogBus::from_samples(vec![2000]);
        let err = calibrate(&bus, 0, &SensorCircuit::default(), 5, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Model(GasModelError::SampleOutOfRange { raw: 2000 })
        ));
    }

    #[tokio::test]
    async fn test_calibrate_bad_channel_and_empty() {
        let bus = MockAnalogBus::constant(512);
        let err = calibrate(&bus, 9, &SensorCircuit::default(), 5, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Hardware(HardwareError::ChannelOutOfRange { channel: 9 })
        ));

        let err = calibrate(&bus, 0, &SensorCircuit::default(), 0, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, CalibrationError::NoSamples));
    }

    #[tokio::test]
    async fn test_calibrate_rejects_zero_baseline() {
        // Converter referenced to the supply and sensor pinned at full scale: Rs = 0
        let circuit = SensorCircuit {
            adc_reference: 5.0,
            ..SensorCircuit::default()
        };
        let bus = MockAnalogBus::constant(1023);
        let err = calibrate(&bus, 0, &circuit, 50, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InvalidBaseline { resistance } if resistance == 0.0
        ));
        assert_eq!(bus.reads(), 50);
    }
}
