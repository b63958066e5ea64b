// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated board for development without hardware
//!
//! The analog bus simulates an MQ-2 sensor in a voltage divider:
//! - clean air gives an Rs/Ro ratio of 9.8 with a little noise
//! - after a warm-up period, gas leaks start at random, peak between
//!   50 and 2000 ppm LPG and decay exponentially
//!
//! The climate sensor behaves like a DHT11, including its habit of failing a
//! read now and then.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, info};
use rand::Rng;

use crate::gas_model::{Gas, SensorCircuit, ADC_MAX_RAW, CLEAN_AIR_RATIO};
use crate::hardware::{
    check_channel, AnalogBus, ClimateReadFault, ClimateReading, ClimateSensor, DigitalOutput,
    HardwareError, Platform,
};

/// Clean-air baseline resistance of the simulated sensor (kΩ)
const SIMULATED_RO_KOHM: f64 = 2.0;
/// Reads before the first leak may start (covers a default calibration)
const WARMUP_READS: u64 = 60;
/// Probability that a leak starts on a given read
const LEAK_PROBABILITY: f64 = 0.02;
/// Fraction of the leak concentration left after each read
const LEAK_DECAY: f64 = 0.93;
/// Probability that a climate read fails
const CLIMATE_FAULT_PROBABILITY: f64 = 0.1;

#[derive(Debug, Default)]
struct GasSimulation {
    reads: u64,
    leak_ppm: f64,
}

/// Simulated MCP3008 with an MQ-2 on every channel
#[derive(Debug)]
pub struct SimulatedAnalogBus {
    circuit: SensorCircuit,
    state: Mutex<GasSimulation>,
}

impl SimulatedAnalogBus {
    pub fn new(circuit: SensorCircuit) -> Self {
        Self {
            circuit,
            state: Mutex::new(GasSimulation::default()),
        }
    }

    /// Raw converter value for a given Rs/Ro ratio
    fn raw_for_ratio(&self, ratio: f64) -> u16 {
        let rs = ratio * SIMULATED_RO_KOHM;
        let vout = self.circuit.supply_voltage * self.circuit.load_resistance
            / (rs + self.circuit.load_resistance);
        let raw = (vout / self.circuit.adc_reference * f64::from(ADC_MAX_RAW)).round();
        raw.clamp(1.0, f64::from(ADC_MAX_RAW)) as u16
    }
}

impl Default for SimulatedAnalogBus {
    fn default() -> Self {
        Self::new(SensorCircuit::default())
    }
}

/// Rs/Ro ratio the LPG curve associates with `ppm`
fn lpg_ratio_for_ppm(ppm: f64) -> f64 {
    let curve = Gas::Lpg.curve();
    10f64.powf(curve.slope * ppm.log10() + curve.intercept)
}

#[async_trait]
impl AnalogBus for SimulatedAnalogBus {
    async fn read_channel(&self, channel: u8) -> Result<u16, HardwareError> {
        check_channel(channel)?;

        let mut rng = rand::rng();
        let mut state = self
            .state
            .lock()
            .map_err(|e| HardwareError::Bus(e.to_string()))?;
        state.reads += 1;

        if state.reads > WARMUP_READS
            && state.leak_ppm < 1.0
            && rng.random_bool(LEAK_PROBABILITY)
        {
            state.leak_ppm = rng.random_range(50.0..2000.0);
            info!("Simulated gas leak started at {:.0} ppm", state.leak_ppm);
        } else {
            state.leak_ppm *= LEAK_DECAY;
        }

        let clean_air = CLEAN_AIR_RATIO * rng.random_range(0.97..1.03);
        let ratio = if state.leak_ppm >= 1.0 {
            lpg_ratio_for_ppm(state.leak_ppm).min(clean_air)
        } else {
            clean_air
        };

        Ok(self.raw_for_ratio(ratio))
    }
}

/// Simulated DHT11
#[derive(Debug, Default)]
pub struct SimulatedClimateSensor;

#[async_trait]
impl ClimateSensor for SimulatedClimateSensor {
    async fn read(&self) -> Result<ClimateReading, ClimateReadFault> {
        let mut rng = rand::rng();
        if rng.random_bool(CLIMATE_FAULT_PROBABILITY) {
            return Err(ClimateReadFault::Checksum);
        }
        Ok(ClimateReading {
            temperature: 22.0 + rng.random_range(-0.5..0.5),
            humidity: 45.0 + rng.random_range(-2.0..2.0),
        })
    }
}

/// Indicator outputs that log level changes
#[derive(Debug, Default)]
pub struct SimulatedOutputs {
    states: Mutex<HashMap<u8, bool>>,
}

#[async_trait]
impl DigitalOutput for SimulatedOutputs {
    async fn set(&self, pin: u8, on: bool) {
        if let Ok(mut states) = self.states.lock() {
            if states.insert(pin, on) != Some(on) {
                debug!("GPIO {} -> {}", pin, if on { "on" } else { "off" });
            }
        }
    }
}

/// A complete simulated board wired as `circuit`
pub fn simulated_platform(circuit: SensorCircuit) -> Platform {
    Platform::new(
        Arc::new(SimulatedAnalogBus::new(circuit)),
        Arc::new(SimulatedOutputs::default()),
        Arc::new(SimulatedClimateSensor),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas_model::{calibrate, concentration_ppm, GasSensorModel};
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn test_ratio_round_trip_through_curve() {
        for ppm in [10.0, 150.0, 900.0] {
            let ratio = lpg_ratio_for_ppm(ppm);
            assert_relative_eq!(
                concentration_ppm(ratio, Gas::Lpg).unwrap(),
                ppm,
                max_relative = 1e-9
            );
        }
    }

    #[tokio::test]
    async fn test_simulated_bus_calibrates_near_nominal_ro() {
        let bus = SimulatedAnalogBus::default();
        let baseline = calibrate(&bus, 0, &SensorCircuit::default(), 50, Duration::ZERO)
            .await
            .unwrap();
        assert!(
            (baseline.resistance() - SIMULATED_RO_KOHM).abs() < 0.2,
            "Ro = {}",
            baseline.resistance()
        );

        let model = GasSensorModel::new(SensorCircuit::default(), baseline, Gas::Lpg);
        let raw = bus.read_channel(0).await.unwrap();
        assert!(model.estimate(raw).is_ok());
    }

    #[tokio::test]
    async fn test_simulated_outputs_and_climate() {
        let platform = simulated_platform(SensorCircuit::default());
        platform.outputs.set(17, true).await;
        assert!(platform.release().await.is_ok());

        for _ in 0..20 {
            match platform.climate.read().await {
                Ok(reading) => {
                    assert!((21.0..23.0).contains(&reading.temperature));
                    assert!((43.0..47.0).contains(&reading.humidity));
                }
                Err(fault) => assert_eq!(fault, ClimateReadFault::Checksum),
            }
        }
    }
}
