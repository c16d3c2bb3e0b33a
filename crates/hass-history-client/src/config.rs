// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of hass-history.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::info;

use crate::errors::{HaError, HaResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8123";

/// Connection settings for one Home Assistant instance
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Long-lived access token sent as bearer credential
    pub token: String,
    /// Response statuses treated as success
    pub accepted_statuses: Vec<StatusCode>,
    /// Request timeout; `None` waits for the server indefinitely
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
            accepted_statuses: vec![StatusCode::OK, StatusCode::CREATED],
            timeout: None,
        }
    }

    /// Build from `HA_BASE_URL` (optional) and `HA_TOKEN` (required)
    pub fn from_env() -> HaResult<Self> {
        let base_url =
            std::env::var("HA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let token = std::env::var("HA_TOKEN").map_err(|_| {
            HaError::ConfigError("HA_TOKEN environment variable not set".to_owned())
        })?;

        info!("Initializing HA history client for {}", base_url);
        Ok(Self::new(base_url, token))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_accepted_statuses(mut self, statuses: Vec<StatusCode>) -> Self {
        self.accepted_statuses = statuses;
        self
    }

    pub fn is_accepted(&self, status: StatusCode) -> bool {
        self.accepted_statuses.contains(&status)
    }
}

// Keeps the token out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("accepted_statuses", &self.accepted_statuses)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_stripped() {
        let config = ClientConfig::new("http://192.168.1.102:8123//", "token");
        assert_eq!(config.base_url, "http://192.168.1.102:8123");
    }

    #[test]
    fn test_default_accepted_statuses() {
        let config = ClientConfig::new("http://localhost:8123", "token");
        assert!(config.is_accepted(StatusCode::OK));
        assert!(config.is_accepted(StatusCode::CREATED));
        assert!(!config.is_accepted(StatusCode::NO_CONTENT));
        assert!(!config.is_accepted(StatusCode::NOT_FOUND));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new("http://localhost:8123", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("localhost:8123"));
    }
}
