// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hardware abstraction for the monitor
//!
//! The monitor only talks to the board through three narrow traits:
//! - [`AnalogBus`]: 8-channel 10-bit converter (MCP3008 on SPI)
//! - [`DigitalOutput`]: indicator LEDs
//! - [`ClimateSensor`]: temperature / humidity sensor (DHT11)
//!
//! Drivers:
//! - Simulated: synthetic gas and climate source for development
//! - Mock: scripted doubles for tests
//! - Native: Raspberry Pi SPI, GPIO and IIO (`native` feature)

pub mod drivers;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use thiserror::Error;

use crate::config::{HardwareConfig, HardwareDriverType};
use crate::gas_model::SensorCircuit;

/// Number of channels on the analog converter
pub const ANALOG_CHANNELS: u8 = 8;

/// Errors raised by the analog bus and output drivers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    #[error("Channel {channel} out of range, must be between 0 and 7")]
    ChannelOutOfRange { channel: u8 },

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Unsupported hardware: {0}")]
    Unsupported(String),
}

/// Recoverable climate sensor failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClimateReadFault {
    #[error("Sensor did not answer in time")]
    Timeout,

    #[error("Checksum mismatch in sensor frame")]
    Checksum,

    #[error("Sensor unavailable: {0}")]
    Unavailable(String),
}

/// One temperature / humidity reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Temperature in °C
    pub temperature: f32,
    /// Relative humidity in %RH
    pub humidity: f32,
}

/// Analog-to-digital converter
#[async_trait]
pub trait AnalogBus: Send + Sync {
    /// Read one raw sample from `channel` (0..=7)
    async fn read_channel(&self, channel: u8) -> Result<u16, HardwareError>;

    /// Close the bus handle
    async fn release(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// Digital outputs driving the indicators
#[async_trait]
pub trait DigitalOutput: Send + Sync {
    /// Drive `pin` high or low. Idempotent.
    async fn set(&self, pin: u8, on: bool);

    /// Release the pins
    async fn release(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// Temperature / humidity sensor
#[async_trait]
pub trait ClimateSensor: Send + Sync {
    async fn read(&self) -> Result<ClimateReading, ClimateReadFault>;

    async fn release(&self) -> Result<(), HardwareError> {
        Ok(())
    }
}

/// Reject channels the converter does not have
pub fn check_channel(channel: u8) -> Result<(), HardwareError> {
    if channel >= ANALOG_CHANNELS {
        return Err(HardwareError::ChannelOutOfRange { channel });
    }
    Ok(())
}

/// The set of collaborators the monitor runs against
#[derive(Clone)]
pub struct Platform {
    pub analog: Arc<dyn AnalogBus>,
    pub outputs: Arc<dyn DigitalOutput>,
    pub climate: Arc<dyn ClimateSensor>,
}

impl Platform {
    pub fn new(
        analog: Arc<dyn AnalogBus>,
        outputs: Arc<dyn DigitalOutput>,
        climate: Arc<dyn ClimateSensor>,
    ) -> Self {
        Self {
            analog,
            outputs,
            climate,
        }
    }

    /// Release every hardware handle, reporting the first failure
    pub async fn release(&self) -> Result<(), HardwareError> {
        debug!("Releasing hardware handles");
        let outputs = self.outputs.release().await;
        let analog = self.analog.release().await;
        let climate = self.climate.release().await;
        outputs.and(analog).and(climate)
    }
}

/// Build the platform selected by the configuration
///
/// `circuit` describes the gas sensor wiring; the simulated board produces
/// samples consistent with it.
pub fn create_platform(
    config: &HardwareConfig,
    circuit: SensorCircuit,
    indicator_pins: &[u8],
) -> Result<Platform> {
    match config.driver {
        HardwareDriverType::Simulated => {
            info!("Using simulated hardware");
            Ok(drivers::simulated::simulated_platform(circuit))
        }
        #[cfg(feature = "native")]
        HardwareDriverType::Native => {
            let _ = circuit;
            info!(
                "Using native hardware (SPI {}, climate {})",
                config.spi_device, config.climate_device
            );
            drivers::native::native_platform(config, indicator_pins)
        }
        #[cfg(not(feature = "native"))]
        HardwareDriverType::Native => {
            let _ = (circuit, indicator_pins);
            Err(HardwareError::Unsupported(
                "native driver requested but airsafe was built without the `native` feature"
                    .to_string(),
            )
            .into())
        }
    }
}
