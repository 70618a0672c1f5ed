use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::types::Config;

/// Overrides the configuration file location.
const CONFIG_ENV: &str = "JADIS_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// `$JADIS_CONFIG` if set, otherwise `jadis/config.toml` under
    /// `dirs::config_dir()` (the current directory if that is unavailable).
    pub fn config_path() -> PathBuf {
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("jadis").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The URL timeout is positive
    /// - No class path entry is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.url_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "defaults.url_timeout_seconds must be greater than 0".to_string(),
            });
        }

        if let Some(i) = self
            .search
            .class_path
            .iter()
            .position(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationError {
                message: format!("search.class_path entry {} is empty", i),
            });
        }

        Ok(())
    }

    pub fn url_timeout(&self) -> Duration {
        Duration::from_secs(self.defaults.url_timeout_seconds)
    }
}
