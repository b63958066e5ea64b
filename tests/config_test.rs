// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use airsafe::config::{self, Config, HardwareDriverType};
use airsafe::gas_model::Gas;
use anyhow::Result;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");

    let mut config = Config::default();
    config.gas_sensor.gas = Gas::Methane;
    config.sampling.interval_ms = 250;
    config.alarm.warning_ppm = 40.0;
    config.reporter.url = "http://collector.local:8080/readings".to_string();
    config.reporter.auth_token = Some("token".to_string());

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;

    assert_eq!(loaded_config, config);

    // A missing file is created with defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config, Config::default());

    Ok(())
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.gas_sensor.channel, 0);
    assert_eq!(config.gas_sensor.gas, Gas::Lpg);
    assert_eq!(config.gas_sensor.load_resistance_kohm, 10.0);
    assert_eq!(config.gas_sensor.supply_voltage, 5.0);
    assert_eq!(config.gas_sensor.adc_reference_voltage, 3.3);
    assert_eq!(config.gas_sensor.calibration_samples, 50);
    assert_eq!(config.sampling.interval_ms, 500);
    assert_eq!(config.sampling.climate_interval_ms, 2000);
    assert_eq!(config.alarm.pins.all(), [17, 27, 22]);
    assert_eq!(config.alarm.blink_period_ms, 200);
    assert_eq!(config.reporter.interval_ms, 5000);
    assert!(config.reporter.enabled);
    assert_eq!(config.hardware.driver, HardwareDriverType::Simulated);
}

#[test]
fn test_partial_file_uses_section_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(
        &config_path,
        r#"
gas_sensor:
  gas: Hydrogen
alarm:
  critical_ppm: 300
reporter:
  enabled: false
"#,
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.gas_sensor.gas, Gas::Hydrogen);
    assert_eq!(config.gas_sensor.calibration_samples, 50);
    assert_eq!(config.alarm.critical_ppm, 300.0);
    assert_eq!(config.alarm.danger_ppm, 100.0);
    assert!(!config.reporter.enabled);
    assert_eq!(config.sampling, Config::default().sampling);

    Ok(())
}

#[test]
fn test_empty_file_is_all_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "")?;

    assert_eq!(Config::from_file(&config_path)?, Config::default());
    Ok(())
}

#[test]
fn test_config_schema_output() -> Result<()> {
    config::output_config_schema()?;
    Ok(())
}
