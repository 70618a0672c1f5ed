use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Settings that apply to every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Message locale such as `de_DE`; the environment decides when unset.
    #[serde(default)]
    pub locale: Option<String>,
    /// Timeout for fetching classes given as `http(s):` URLs (default: 10).
    #[serde(default = "default_url_timeout")]
    pub url_timeout_seconds: u64,
}

/// Search path defaults, overridden by command-line options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Class path used when no `-cp` is given; takes precedence over `CLASSPATH`.
    #[serde(default)]
    pub class_path: Vec<PathBuf>,
    /// JDK home whose `modules` directory holds the system modules.
    #[serde(default)]
    pub system: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            locale: None,
            url_timeout_seconds: default_url_timeout(),
        }
    }
}

fn default_url_timeout() -> u64 {
    10
}
