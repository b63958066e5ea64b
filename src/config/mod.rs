// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the monitor
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `gas_sensor`: sensor circuit, target gas and calibration pass
//! - `sampling`: cadence of the gas and climate reads
//! - `alarm`: concentration thresholds and indicator pins
//! - `reporter`: remote collector endpoint and cadence
//! - `hardware`: driver selection and device paths
//!
//! ## Usage
//!
//! ```no_run
//! use airsafe::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     true,                                          // Force simulated hardware
//!     Some("Methane".parse().unwrap()),              // Gas
//!     Some("http://collector.local/api".to_string()), // Reporter URL
//!     false,                                         // Disable reporting
//! );
//!
//! println!("Sampling every {} ms", config.sampling.interval_ms);
//! ```

pub mod alarm;
pub mod gas_sensor;
pub mod hardware;
pub mod reporter;
pub mod sampling;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::gas_model::Gas;

pub use alarm::{AlarmConfig, IndicatorPins};
pub use gas_sensor::GasSensorConfig;
pub use hardware::{HardwareConfig, HardwareDriverType};
pub use reporter::ReporterConfig;
pub use sampling::SamplingConfig;
pub use utils::{output_config_schema, validate_specific_rules};

/// Embedded JSON schema of the configuration file
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure for the monitor.
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gas sensor circuit, gas species and calibration settings.
    #[serde(default)]
    pub gas_sensor: GasSensorConfig,

    /// Cadence of the sampling loop.
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Alarm thresholds and indicator wiring.
    #[serde(default)]
    pub alarm: AlarmConfig,

    /// Remote reporting settings.
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Hardware driver selection.
    #[serde(default)]
    pub hardware: HardwareConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // Empty documents parse as null, which stands for "all defaults"
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// # Parameters
    ///
    /// * `simulate` - If true, forces the simulated hardware driver
    /// * `gas` - Optional gas species to estimate
    /// * `url` - Optional reporter endpoint
    /// * `no_report` - If true, disables the periodic reporter
    pub fn apply_args(
        &mut self,
        simulate: bool,
        gas: Option<Gas>,
        url: Option<String>,
        no_report: bool,
    ) {
        if simulate {
            debug!("Forcing simulated hardware from command line");
            self.hardware.driver = HardwareDriverType::Simulated;
        }

        if let Some(gas) = gas {
            debug!("Overriding gas from command line: {}", gas);
            self.gas_sensor.gas = gas;
        }

        if let Some(url) = url {
            debug!("Overriding reporter URL from command line: {}", url);
            self.reporter.url = url;
        }

        if no_report {
            debug!("Disabling reporter from command line");
            self.reporter.enabled = false;
        }
    }
}
