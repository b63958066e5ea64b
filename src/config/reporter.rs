// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Remote reporting configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Periodic reporter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Enable or disable the periodic reporter
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Collector endpoint receiving the JSON reports (http:// or https://)
    #[serde(default = "default_url")]
    pub url: String,

    /// Delay between two reports in milliseconds
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// Timeout of a single delivery attempt in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// How long shutdown waits for the reporter to finish its cycle, in milliseconds
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,

    /// Optional bearer token sent with every report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_url() -> String {
    "https://api.maxi-script.com/airsafe".to_string()
}

fn default_interval() -> u64 {
    5000
}

fn default_timeout() -> u64 {
    5000
}

fn default_shutdown_grace() -> u64 {
    2000
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_url(),
            interval_ms: default_interval(),
            timeout_ms: default_timeout(),
            shutdown_grace_ms: default_shutdown_grace(),
            auth_token: None,
        }
    }
}

impl ReporterConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
