// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP/HTTPS delivery transport
//!
//! POSTs the payload as JSON to the collector URL, with an optional bearer
//! token. Any non-2xx answer counts as a failed delivery.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{DeliveryError, DeliveryTransport, ReportPayload};
use crate::config::ReporterConfig;

/// Delivers payloads to an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Collector URL
    url: String,
    /// Optional authentication token
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Send `token` as a bearer token with every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn from_config(config: &ReporterConfig) -> Self {
        let transport = Self::new(config.url.clone());
        match &config.auth_token {
            Some(token) => transport.with_auth_token(token.clone()),
            None => transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post(&self, payload: &ReportPayload, timeout: Duration) -> Result<(), DeliveryError> {
        let mut request = self.client.post(&self.url).json(payload).timeout(timeout);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout
            } else {
                DeliveryError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
            });
        }

        debug!("Collector at {} answered {}", self.url, status);
        Ok(())
    }
}
