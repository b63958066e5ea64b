// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Main sampling loop
//!
//! Each iteration reads the gas sensor, runs the model, publishes the
//! concentration, drives the alarm and, at a slower cadence, reads the
//! climate sensor. Gas sensor and model faults end the loop; climate faults
//! are logged and skipped.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::SamplingConfig;
use crate::gas_model::{Estimate, GasModelError, GasSensorModel};
use crate::hardware::{AnalogBus, ClimateSensor, HardwareError};
use crate::monitor::alarm::AlarmActuator;
use crate::monitor::shared_state::{ReadingUpdate, ReadingsStore};
use crate::monitor::shutdown::ShutdownSignal;

/// Fault that stops the sampling loop
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingFault {
    #[error("Gas model fault: {0}")]
    Model(#[from] GasModelError),

    #[error("Gas sensor fault: {0}")]
    Hardware(#[from] HardwareError),
}

/// Gas and climate sampling driving the alarm and the readings store
pub struct SamplingLoop {
    analog: Arc<dyn AnalogBus>,
    climate: Arc<dyn ClimateSensor>,
    channel: u8,
    model: GasSensorModel,
    store: ReadingsStore,
    interval: Duration,
    climate_interval: Duration,
    /// Time of the last climate read attempt, successful or not
    last_climate_attempt: Option<Instant>,
    iterations: u64,
}

impl SamplingLoop {
    pub fn new(
        analog: Arc<dyn AnalogBus>,
        climate: Arc<dyn ClimateSensor>,
        channel: u8,
        model: GasSensorModel,
        store: ReadingsStore,
        config: &SamplingConfig,
    ) -> Self {
        Self {
            analog,
            climate,
            channel,
            model,
            store,
            interval: config.interval(),
            climate_interval: config.climate_interval(),
            last_climate_attempt: None,
            iterations: 0,
        }
    }

    /// Number of completed iterations
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Iterate until `shutdown` is set or a fatal fault occurs
    pub async fn run(
        &mut self,
        actuator: &mut AlarmActuator,
        shutdown: &ShutdownSignal,
    ) -> Result<(), SamplingFault> {
        info!(
            "Sampling {} on channel {} every {:?}",
            self.model.gas, self.channel, self.interval
        );

        while !shutdown.is_triggered() {
            if let Err(fault) = self.step(actuator).await {
                error!("Fatal sampling fault: {}", fault);
                return Err(fault);
            }
            if shutdown.sleep(self.interval).await {
                break;
            }
        }

        info!("Sampling loop stopped after {} iterations", self.iterations);
        Ok(())
    }

    /// One iteration without the trailing sleep
    pub async fn step(&mut self, actuator: &mut AlarmActuator) -> Result<Estimate, SamplingFault> {
        let raw = self.analog.read_channel(self.channel).await?;
        let estimate = self.model.estimate(raw)?;
        debug!(
            "ADC: {} | Vout: {:.3} V | Rs/Ro: {:.3} | {}: {:.2} ppm",
            raw, estimate.sample.voltage, estimate.ratio, self.model.gas, estimate.ppm
        );

        self.store
            .update(ReadingUpdate::Concentration(estimate.ppm))
            .await;
        actuator.apply(estimate.ppm).await;
        self.poll_climate().await;

        self.iterations += 1;
        Ok(estimate)
    }

    /// Read the climate sensor if the cadence allows it.
    ///
    /// A failed attempt still counts as an attempt for the cadence.
    async fn poll_climate(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_climate_attempt {
            if now.duration_since(last) < self.climate_interval {
                return;
            }
        }
        self.last_climate_attempt = Some(now);

        match self.climate.read().await {
            Ok(reading) => {
                debug!(
                    "Temperature: {:.1} °C | Humidity: {:.1} %",
                    reading.temperature, reading.humidity
                );
                self.store
                    .update_all(&[
                        ReadingUpdate::Temperature(reading.temperature),
                        ReadingUpdate::Humidity(reading.humidity),
                    ])
                    .await;
            }
            Err(fault) => warn!("Climate sensor read failed: {}", fault),
        }
    }
}
