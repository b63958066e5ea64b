// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Monitor control loop
//!
//! [`Monitor`] wires the activities together:
//! - the periodic reporter, spawned first and running for the whole process
//! - the clean-air calibration, which must finish before sampling starts
//! - the sampling loop on the calling task, driving the [`AlarmActuator`]
//!   and its blink task
//!
//! Whatever ends the sampling loop (shutdown request or fatal fault), the
//! [`ShutdownCoordinator`] then stops the reporter, turns the indicators off
//! and releases the hardware before [`Monitor::run`] returns.

pub mod alarm;
pub mod sampling;
pub mod shared_state;
pub mod shutdown;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::gas_model::{calibrate, GasSensorModel};
use crate::hardware::Platform;
use crate::reporter::{DeliveryTransport, HttpTransport, PeriodicReporter};

pub use alarm::{AlarmActuator, AlarmState};
pub use sampling::{SamplingFault, SamplingLoop};
pub use shared_state::{ReadingUpdate, Readings, ReadingsStore};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// The whole monitor, ready to run
pub struct Monitor {
    config: Config,
    platform: Platform,
    store: ReadingsStore,
    shutdown: ShutdownSignal,
    transport: Option<Arc<dyn DeliveryTransport>>,
    handle_interrupt: bool,
}

impl Monitor {
    pub fn new(config: Config, platform: Platform) -> Self {
        Self {
            config,
            platform,
            store: ReadingsStore::new(),
            shutdown: ShutdownSignal::new(),
            transport: None,
            handle_interrupt: true,
        }
    }

    /// Deliver through `transport` instead of HTTP
    pub fn with_transport(mut self, transport: Arc<dyn DeliveryTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Do not subscribe to Ctrl+C; shutdown then comes only from [`shutdown_signal`](Self::shutdown_signal)
    pub fn without_interrupt_handler(mut self) -> Self {
        self.handle_interrupt = false;
        self
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn readings(&self) -> ReadingsStore {
        self.store.clone()
    }

    /// Run until shutdown is requested or a fatal fault occurs.
    ///
    /// Cleanup always runs before returning. Calibration and sampling faults
    /// are returned as errors.
    pub async fn run(self) -> Result<()> {
        let Monitor {
            config,
            platform,
            store,
            shutdown,
            transport,
            handle_interrupt,
        } = self;

        let mut coordinator =
            ShutdownCoordinator::new(shutdown.clone(), config.reporter.shutdown_grace());
        if handle_interrupt {
            coordinator.install_interrupt_handler();
        }
        let mut actuator = AlarmActuator::new(platform.outputs.clone(), &config.alarm);

        if config.reporter.enabled {
            let transport = transport.unwrap_or_else(|| {
                info!("Reporting to {}", config.reporter.url);
                Arc::new(HttpTransport::from_config(&config.reporter)) as Arc<dyn DeliveryTransport>
            });
            let reporter = PeriodicReporter::from_config(store.clone(), transport, &config.reporter);
            coordinator.register_reporter(reporter.spawn(shutdown.clone()));
        } else {
            info!("Reporting disabled");
        }

        let outcome = sample(&config, &platform, &store, &shutdown, &mut actuator).await;
        let released = coordinator.shutdown(&mut actuator, &platform).await;

        outcome?;
        released.context("Failed to release hardware")?;
        info!("Monitor stopped");
        Ok(())
    }
}

/// Calibrate, then run the sampling loop until it ends
async fn sample(
    config: &Config,
    platform: &Platform,
    store: &ReadingsStore,
    shutdown: &ShutdownSignal,
    actuator: &mut AlarmActuator,
) -> Result<()> {
    let sensor = &config.gas_sensor;
    let circuit = sensor.circuit();

    let baseline = tokio::select! {
        result = calibrate(
            platform.analog.as_ref(),
            sensor.channel,
            &circuit,
            sensor.calibration_samples,
            sensor.calibration_delay(),
        ) => result.context("Gas sensor calibration failed")?,
        _ = shutdown.wait() => {
            info!("Shutdown requested during calibration");
            return Ok(());
        }
    };

    let model = GasSensorModel::new(circuit, baseline, sensor.gas);
    let mut sampling = SamplingLoop::new(
        platform.analog.clone(),
        platform.climate.clone(),
        sensor.channel,
        model,
        store.clone(),
        &config.sampling,
    );
    sampling
        .run(actuator, shutdown)
        .await
        .context("Sampling stopped on a fatal fault")?;
    Ok(())
}
