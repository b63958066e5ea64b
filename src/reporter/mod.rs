// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Periodic delivery of the readings to a remote collector
//!
//! On every tick the reporter snapshots the [`ReadingsStore`] and, when every
//! field is known, makes a single delivery attempt through a
//! [`DeliveryTransport`]. Incomplete snapshots are skipped and delivery
//! failures are logged; neither is retried before the next tick.

pub mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::ReporterConfig;
use crate::monitor::shared_state::{Readings, ReadingsStore};
use crate::monitor::shutdown::ShutdownSignal;

pub use http::HttpTransport;

/// Body of one delivery
///
/// Serialised as a JSON object with four required keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    /// Unix time in seconds
    pub timestamp: f64,
    /// °C
    pub temperature: f32,
    /// %RH
    pub humidity: f32,
    /// ppm
    pub concentration: f64,
}

impl ReportPayload {
    /// Build a payload from a complete snapshot, `None` if any field is missing
    pub fn from_readings(readings: &Readings, timestamp: f64) -> Option<Self> {
        Some(Self {
            timestamp,
            temperature: readings.temperature?,
            humidity: readings.humidity?,
            concentration: readings.concentration?,
        })
    }
}

/// Current Unix time in seconds with sub-second precision
pub fn unix_timestamp() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Recoverable delivery failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Collector answered HTTP {status}")]
    Status { status: u16 },
}

/// Sends one payload to the collector
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn post(&self, payload: &ReportPayload, timeout: Duration) -> Result<(), DeliveryError>;
}

/// Background activity delivering the readings on a fixed cadence
pub struct PeriodicReporter {
    store: ReadingsStore,
    transport: Arc<dyn DeliveryTransport>,
    interval: Duration,
    timeout: Duration,
}

impl PeriodicReporter {
    /// Reporter delivering every `interval`, each attempt bounded by `timeout`
    pub fn new(
        store: ReadingsStore,
        transport: Arc<dyn DeliveryTransport>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            interval,
            timeout,
        }
    }

    /// Reporter with the cadence and timeout of the `reporter` section
    pub fn from_config(
        store: ReadingsStore,
        transport: Arc<dyn DeliveryTransport>,
        config: &ReporterConfig,
    ) -> Self {
        Self::new(store, transport, config.interval(), config.timeout())
    }

    /// Run [`run`](Self::run) on its own task
    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(&shutdown).await })
    }

    /// Report once per interval until `shutdown` is set
    pub async fn run(&self, shutdown: &ShutdownSignal) {
        info!("Reporter started, delivering every {:?}", self.interval);
        while !shutdown.sleep(self.interval).await {
            self.report_once().await;
        }
        info!("Reporter stopped");
    }

    /// One reporting cycle. Returns whether a payload was delivered.
    pub async fn report_once(&self) -> bool {
        let readings = self.store.snapshot().await;
        let Some(payload) = ReportPayload::from_readings(&readings, unix_timestamp()) else {
            debug!("Readings incomplete, skipping report: {:?}", readings);
            return false;
        };

        match self.transport.post(&payload, self.timeout).await {
            Ok(()) => {
                debug!(
                    "Delivered {:.2} ppm, {:.1} °C, {:.1} %",
                    payload.concentration, payload.temperature, payload.humidity
                );
                true
            }
            Err(e) => {
                warn!("Failed to deliver readings: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::shared_state::ReadingUpdate;
    use mockall::mock;

    mock! {
        pub Transport {}

        #[async_trait]
        impl DeliveryTransport for Transport {
            async fn post(&self, payload: &ReportPayload, timeout: Duration) -> Result<(), DeliveryError>;
        }
    }

    async fn complete_store() -> ReadingsStore {
        let store = ReadingsStore::new();
        store
            .update_all(&[
                ReadingUpdate::Temperature(22.5),
                ReadingUpdate::Humidity(41.0),
                ReadingUpdate::Concentration(12.25),
            ])
            .await;
        store
    }

    #[test]
    fn test_payload_shape() {
        let readings = Readings {
            temperature: Some(22.5),
            humidity: Some(41.0),
            concentration: Some(12.25),
        };
        let payload = ReportPayload::from_readings(&readings, 1_700_000_000.5).unwrap();
        let json = serde_json::to_value(payload).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        assert_eq!(json["timestamp"], 1_700_000_000.5);
        assert_eq!(json["temperature"], 22.5);
        assert_eq!(json["humidity"], 41.0);
        assert_eq!(json["concentration"], 12.25);
    }

    #[test]
    fn test_partial_readings_give_no_payload() {
        let readings = Readings {
            temperature: None,
            humidity: Some(41.0),
            concentration: Some(12.25),
        };
        assert!(ReportPayload::from_readings(&readings, 0.0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_snapshot_is_not_sent() {
        let store = ReadingsStore::new();
        store.update(ReadingUpdate::Concentration(3.0)).await;

        let mut transport = MockTransport::new();
        transport.expect_post().never();
        let transport = Arc::new(transport);

        let reporter = PeriodicReporter::new(
            store,
            transport.clone(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        let shutdown = ShutdownSignal::new();
        let handle = reporter.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_secs(21)).await;
        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_delivery_per_tick() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .withf(|payload, timeout| {
                payload.concentration == 12.25 && *timeout == Duration::from_secs(2)
            })
            .times(3)
            .returning(|_, _| Ok(()));
        let transport = Arc::new(transport);

        let reporter = PeriodicReporter::new(
            complete_store().await,
            transport.clone(),
            Duration::from_secs(5),
            Duration::from_secs(2),
        );
        let shutdown = ShutdownSignal::new();
        let handle = reporter.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(15_100)).await;
        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_is_not_retried() {
        let mut transport = MockTransport::new();
        transport
            .expect_post()
            .times(2)
            .returning(|_, _| Err(DeliveryError::Status { status: 503 }));
        let transport = Arc::new(transport);

        let reporter = PeriodicReporter::new(
            complete_store().await,
            transport.clone(),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        let shutdown = ShutdownSignal::new();
        let handle = reporter.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        shutdown.trigger();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_report_once_outcome() {
        let mut transport = MockTransport::new();
        transport.expect_post().times(1).returning(|_, _| Ok(()));
        let reporter = PeriodicReporter::new(
            complete_store().await,
            Arc::new(transport),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        assert!(reporter.report_once().await);
    }
}
