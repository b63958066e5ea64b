// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use airsafe::config::Config;
use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

/// Load `contents` and check that loading fails and leaves a valid sample behind
fn assert_rejected_with_sample(contents: &str) -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");

    let sample_path = config_path.with_extension("sample.yaml");
    assert!(
        Path::new(&sample_path).exists(),
        "Sample config file was not created"
    );

    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config, Config::default());

    Ok(())
}

#[test]
fn test_type_mismatch_creates_sample_file() -> Result<()> {
    assert_rejected_with_sample(
        r#"
gas_sensor:
  channel: "zero"
  load_resistance_kohm: []
sampling:
  interval_ms: "fast"
"#,
    )
}

#[test]
fn test_unknown_gas_is_rejected() -> Result<()> {
    assert_rejected_with_sample(
        r#"
gas_sensor:
  gas: Propane
"#,
    )
}

#[test]
fn test_unknown_key_is_rejected() -> Result<()> {
    assert_rejected_with_sample(
        r#"
visualization:
  port: 8080
"#,
    )
}

#[test]
fn test_channel_out_of_range_is_rejected() -> Result<()> {
    assert_rejected_with_sample(
        r#"
gas_sensor:
  channel: 8
"#,
    )
}

#[test]
fn test_unordered_thresholds_are_rejected() -> Result<()> {
    // Valid for the schema, caught by the specific rules
    assert_rejected_with_sample(
        r#"
alarm:
  warning_ppm: 150
  danger_ppm: 100
  critical_ppm: 200
"#,
    )
}

#[test]
fn test_shared_indicator_pin_is_rejected() -> Result<()> {
    assert_rejected_with_sample(
        r#"
alarm:
  pins:
    green: 17
    yellow: 17
    red: 22
"#,
    )
}

#[test]
fn test_bad_reporter_url_is_rejected() -> Result<()> {
    assert_rejected_with_sample(
        r#"
reporter:
  url: "ftp://collector.local"
"#,
    )
}

#[test]
fn test_malformed_yaml_fails() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "gas_sensor: [unclosed")?;

    assert!(Config::from_file(&config_path).is_err());
    Ok(())
}
