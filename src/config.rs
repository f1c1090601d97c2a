//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::state::LightId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Light service base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Status poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Lights are numbered 1..=light_count
    #[serde(default = "default_light_count")]
    pub light_count: LightId,

    /// Song names offered to the user
    #[serde(default = "default_songs")]
    pub songs: Vec<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            light_count: default_light_count(),
            songs: default_songs(),
        }
    }
}

// Defaults
fn default_base_url() -> String { "http://192.168.0.139:5000".to_string() }
fn default_request_timeout() -> u64 { 5 }
fn default_poll_interval() -> u64 { 10 }
fn default_light_count() -> LightId { 11 }
fn default_songs() -> Vec<String> {
    vec!["song1".to_string(), "song2".to_string(), "song3".to_string()]
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("service.base_url is empty".into()));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "service.request_timeout_secs must be positive".into(),
            ));
        }
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_secs must be positive".into(),
            ));
        }
        if self.panel.light_count == 0 {
            return Err(ConfigError::Invalid(
                "panel.light_count must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.polling.interval_secs)
    }
}
