//! Configuration loading and management for smartsum.
//!
//! Loads settings from `smartsum.toml` with an environment variable override
//! for the service URL.

use crate::summary::SummaryMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "SMARTSUM_API_URL";

const CONFIG_FILE: &str = "smartsum.toml";
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Summarisation service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the service, without the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Defaults applied to every summary request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Mode used on startup and restored on reset
    #[serde(default)]
    pub mode: SummaryMode,
    /// Optional length hint forwarded to the service
    #[serde(default)]
    pub max_length: Option<u32>,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `SMARTSUM_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file used by the TUI
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location (smartsum.toml in cwd or
    /// home). Defaults apply when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        self.override_api_url(std::env::var(API_URL_ENV).ok());
    }

    /// Replace the base URL when `url` is set and non-blank
    pub fn override_api_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("smartsum")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Log file for the TUI: configured path, or the platform data dir.
    pub fn log_file(&self) -> PathBuf {
        self.logging.file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("smartsum")
                .join("smartsum.log")
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}
