// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the AirSafe gas monitor
use std::path::PathBuf;
use std::time::Duration;

use airsafe::config::{self, Config};
use airsafe::gas_model::Gas;
use airsafe::hardware::create_platform;
use airsafe::monitor::{AlarmActuator, Monitor};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

/// Gas leak monitor with alarm indicators and remote reporting
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Use the simulated hardware whatever the configuration says
    #[arg(long)]
    simulate: bool,

    /// Gas to estimate (LPG, Methane, Hydrogen or Alcohol)
    #[arg(long)]
    gas: Option<Gas>,

    /// Collector URL for the periodic reports
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Do not send reports
    #[arg(long)]
    no_report: bool,

    /// Light each indicator in turn and exit
    #[arg(long)]
    indicator_test: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;
    config.apply_args(args.simulate, args.gas, args.url.clone(), args.no_report);

    let platform = create_platform(
        &config.hardware,
        config.gas_sensor.circuit(),
        &config.alarm.pins.all(),
    )
        .context("Failed to initialise hardware")?;

    if args.indicator_test {
        let mut actuator = AlarmActuator::new(platform.outputs.clone(), &config.alarm);
        actuator.lamp_test(Duration::from_secs(1)).await;
        platform
            .release()
            .await
            .context("Failed to release hardware")?;
        return Ok(());
    }

    info!("AirSafe monitor starting ({})", config.gas_sensor.gas);
    Monitor::new(config, platform).run().await
}
