// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, CONFIG_SCHEMA};
use crate::hardware::ANALOG_CHANNELS;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./airsafe --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Sensor circuit**: load resistance and voltages are positive, and the
///   converter reference does not exceed the divider supply
/// - **Converter channel**: within the 8 channels of the MCP3008
/// - **Thresholds**: warning < danger < critical
/// - **Indicators**: the three pins are distinct
/// - **Cadences**: every interval and timeout is non-zero
/// - **Reporter URL**: starts with `http://` or `https://`
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let sensor = &config.gas_sensor;
    if sensor.channel >= ANALOG_CHANNELS {
        anyhow::bail!(
            "Invalid gas sensor channel {}: must be between 0 and {}",
            sensor.channel,
            ANALOG_CHANNELS - 1
        );
    }
    if sensor.load_resistance_kohm <= 0.0 {
        anyhow::bail!(
            "Load resistance must be positive, got {} kΩ",
            sensor.load_resistance_kohm
        );
    }
    if sensor.supply_voltage <= 0.0 || sensor.adc_reference_voltage <= 0.0 {
        anyhow::bail!("Supply and converter reference voltages must be positive");
    }
    if sensor.adc_reference_voltage > sensor.supply_voltage {
        anyhow::bail!(
            "Converter reference {} V exceeds the sensor supply {} V",
            sensor.adc_reference_voltage,
            sensor.supply_voltage
        );
    }
    if sensor.calibration_samples == 0 {
        anyhow::bail!("Calibration needs at least one sample");
    }

    let alarm = &config.alarm;
    if !(alarm.warning_ppm < alarm.danger_ppm && alarm.danger_ppm < alarm.critical_ppm) {
        anyhow::bail!(
            "Alarm thresholds must be strictly ascending: warning {} < danger {} < critical {}",
            alarm.warning_ppm,
            alarm.danger_ppm,
            alarm.critical_ppm
        );
    }
    let pins = alarm.pins;
    if pins.green == pins.yellow || pins.green == pins.red || pins.yellow == pins.red {
        anyhow::bail!(
            "Indicator pins must be distinct: green {}, yellow {}, red {}",
            pins.green,
            pins.yellow,
            pins.red
        );
    }
    if alarm.blink_period_ms == 0 {
        anyhow::bail!("Blink period must be non-zero");
    }

    if config.sampling.interval_ms == 0 || config.sampling.climate_interval_ms == 0 {
        anyhow::bail!("Sampling intervals must be non-zero");
    }

    let reporter = &config.reporter;
    if !reporter.url.starts_with("http://") && !reporter.url.starts_with("https://") {
        anyhow::bail!(
            "Invalid reporter URL '{}': must start with http:// or https://",
            reporter.url
        );
    }
    if reporter.interval_ms == 0 || reporter.timeout_ms == 0 {
        anyhow::bail!("Reporter interval and timeout must be non-zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unordered_thresholds() {
        let mut config = Config::default();
        config.alarm.danger_ppm = 40.0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_rejects_shared_pins() {
        let mut config = Config::default();
        config.alarm.pins.red = config.alarm.pins.green;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_circuit() {
        let mut config = Config::default();
        config.gas_sensor.adc_reference_voltage = 6.0;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.gas_sensor.channel = 8;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = Config::default();
        config.reporter.url = "ftp://collector".to_string();
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_embedded_schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA).unwrap();
        assert!(schema["properties"]["gas_sensor"].is_object());
    }
}
