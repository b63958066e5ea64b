// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hardware driver configuration

use serde::{Deserialize, Serialize};

/// Hardware driver selection and device paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Driver type: "simulated" or "native" (Raspberry Pi)
    #[serde(default)]
    pub driver: HardwareDriverType,

    /// spidev device of the MCP3008 converter
    #[serde(default = "default_spi_device")]
    pub spi_device: String,

    /// SPI clock in Hz
    #[serde(default = "default_spi_speed")]
    pub spi_speed_hz: u32,

    /// IIO device directory of the DHT11
    #[serde(default = "default_climate_device")]
    pub climate_device: String,
}

/// Hardware driver enumeration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareDriverType {
    /// Synthetic sensor data, indicators logged
    #[default]
    Simulated,
    /// Raspberry Pi SPI, GPIO and IIO devices
    Native,
}

fn default_spi_device() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_spi_speed() -> u32 {
    1_350_000
}

fn default_climate_device() -> String {
    "/sys/bus/iio/devices/iio:device0".to_string()
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            driver: HardwareDriverType::default(),
            spi_device: default_spi_device(),
            spi_speed_hz: default_spi_speed(),
            climate_device: default_climate_device(),
        }
    }
}
