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

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hass_history_client::ClientConfig;
use hass_history_store::DEFAULT_DB_PATH;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "hass-history.toml";

/// Environment variable holding the long-lived access token
pub const TOKEN_ENV_VAR: &str = "HA_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub home_assistant: HomeAssistantSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Used only when `HA_TOKEN` is unset
    #[serde(default)]
    pub token: Option<String>,
    /// No timeout when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_entities")]
    pub entities: Vec<String>,
}

fn default_base_url() -> String {
    hass_history_client::config::DEFAULT_BASE_URL.to_owned()
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_entities() -> Vec<String> {
    vec![
        "sensor.meter_voltage_r".to_owned(),
        "sensor.ac_active_power".to_owned(),
    ]
}

impl Default for HomeAssistantSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: None,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            entities: default_entities(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if present, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    pub fn validate(&self) -> Result<()> {
        if self.home_assistant.base_url.trim().is_empty() {
            bail!("home_assistant.base_url must be set");
        }
        if self
            .home_assistant
            .token
            .as_deref()
            .is_some_and(|t| t.trim().is_empty())
        {
            bail!("home_assistant.token must not be empty when set");
        }
        Ok(())
    }

    /// Client settings with the token taken from `env_token` first, then the config file
    pub fn client_config(&self, env_token: Option<String>) -> Result<ClientConfig> {
        let token = env_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.home_assistant.token.clone())
            .with_context(|| {
                format!("No token found: set {TOKEN_ENV_VAR} or home_assistant.token")
            })?;

        let config = ClientConfig::new(&self.home_assistant.base_url, token);
        Ok(match self.home_assistant.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        })
    }
}
