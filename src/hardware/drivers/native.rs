// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Native Raspberry Pi drivers
//!
//! - MCP3008 10-bit converter on `/dev/spidev*`
//! - Indicator LEDs on sysfs GPIO (BCM numbering)
//! - DHT11 through the kernel IIO driver (`dtoverlay=dht11`), which exposes
//!   `in_temp_input` in m°C and `in_humidityrelative_input` in m%RH

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::spi::SpiDevice;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::sysfs_gpio::Direction;
use linux_embedded_hal::{SpidevDevice, SysfsPin};
use log::{debug, error, warn};

use crate::config::HardwareConfig;
use crate::hardware::{
    check_channel, AnalogBus, ClimateReadFault, ClimateReading, ClimateSensor, DigitalOutput,
    HardwareError, Platform,
};

/// MCP3008 on a spidev device
pub struct Mcp3008Driver {
    spi: Mutex<SpidevDevice>,
}

impl Mcp3008Driver {
    pub fn new(device_path: &str, speed_hz: u32) -> Result<Self> {
        let mut spi = SpidevDevice::open(device_path)
            .map_err(|e| anyhow::anyhow!("Failed to open SPI device {}: {:?}", device_path, e))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        spi.0
            .configure(&options)
            .with_context(|| format!("Failed to configure SPI device {}", device_path))?;
        debug!("Opened {} at {} Hz", device_path, speed_hz);

        Ok(Self {
            spi: Mutex::new(spi),
        })
    }
}

/// Command frame selecting single-ended `channel`
fn mcp3008_request(channel: u8) -> [u8; 3] {
    [1, (8 + channel) << 4, 0]
}

/// 10-bit result carried by a response frame
fn mcp3008_decode(response: &[u8; 3]) -> u16 {
    (u16::from(response[1] & 0x03) << 8) | u16::from(response[2])
}

#[async_trait]
impl AnalogBus for Mcp3008Driver {
    async fn read_channel(&self, channel: u8) -> Result<u16, HardwareError> {
        check_channel(channel)?;

        let request = mcp3008_request(channel);
        let mut response = [0u8; 3];
        let mut spi = self
            .spi
            .lock()
            .map_err(|e| HardwareError::Bus(e.to_string()))?;
        spi.transfer(&mut response, &request)
            .map_err(|e| HardwareError::Bus(format!("SPI transfer failed: {:?}", e)))?;

        Ok(mcp3008_decode(&response))
    }
}

/// Indicator LEDs on sysfs GPIO
pub struct SysfsOutputs {
    pins: Mutex<Vec<(u8, SysfsPin)>>,
}

impl SysfsOutputs {
    pub fn new(pin_numbers: &[u8]) -> Result<Self> {
        let mut pins = Vec::with_capacity(pin_numbers.len());
        for &number in pin_numbers {
            let pin = SysfsPin::new(u64::from(number));
            pin.0
                .export()
                .with_context(|| format!("Failed to export GPIO {}", number))?;
            pin.0
                .set_direction(Direction::Low)
                .with_context(|| format!("Failed to set GPIO {} as output", number))?;
            pins.push((number, pin));
        }
        Ok(Self {
            pins: Mutex::new(pins),
        })
    }
}

#[async_trait]
impl DigitalOutput for SysfsOutputs {
    async fn set(&self, pin: u8, on: bool) {
        let Ok(mut pins) = self.pins.lock() else {
            error!("GPIO table lock poisoned");
            return;
        };
        match pins.iter_mut().find(|(number, _)| *number == pin) {
            Some((_, gpio)) => {
                if let Err(e) = gpio.set_state(PinState::from(on)) {
                    warn!("Failed to drive GPIO {}: {:?}", pin, e);
                }
            }
            None => warn!("GPIO {} is not an indicator output", pin),
        }
    }

    async fn release(&self) -> Result<(), HardwareError> {
        let mut pins = self
            .pins
            .lock()
            .map_err(|e| HardwareError::Bus(e.to_string()))?;
        for (number, pin) in pins.drain(..) {
            pin.0
                .unexport()
                .map_err(|e| HardwareError::Bus(format!("Failed to unexport GPIO {}: {}", number, e)))?;
        }
        Ok(())
    }
}

/// DHT11 read through the IIO subsystem
pub struct IioDht11Sensor {
    device_dir: PathBuf,
}

impl IioDht11Sensor {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }

    async fn read_milli(&self, attribute: &str) -> Result<f32, ClimateReadFault> {
        let path = self.device_dir.join(attribute);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::TimedOut => ClimateReadFault::Timeout,
                _ if e.raw_os_error() == Some(5) => ClimateReadFault::Checksum,
                _ => ClimateReadFault::Unavailable(format!("{}: {}", path.display(), e)),
            })?;
        let milli: i32 = contents.trim().parse().map_err(|_| {
            ClimateReadFault::Unavailable(format!(
                "{}: unexpected value '{}'",
                path.display(),
                contents.trim()
            ))
        })?;
        Ok(milli as f32 / 1000.0)
    }
}

#[async_trait]
impl ClimateSensor for IioDht11Sensor {
    async fn read(&self) -> Result<ClimateReading, ClimateReadFault> {
        let temperature = self.read_milli("in_temp_input").await?;
        let humidity = self.read_milli("in_humidityrelative_input").await?;
        Ok(ClimateReading {
            temperature,
            humidity,
        })
    }
}

/// Build the Raspberry Pi platform
pub fn native_platform(config: &HardwareConfig, indicator_pins: &[u8]) -> Result<Platform> {
    let analog = Mcp3008Driver::new(&config.spi_device, config.spi_speed_hz)?;
    let outputs = SysfsOutputs::new(indicator_pins)?;
    let climate = IioDht11Sensor::new(&config.climate_device);

    Ok(Platform::new(
        Arc::new(analog),
        Arc::new(outputs),
        Arc::new(climate),
    ))
}
