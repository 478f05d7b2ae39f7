//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "JACKRABBIT";

/// Overrides read from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Default timeout from JACKRABBIT_TIMEOUT
    pub timeout: Option<u64>,
    /// Log level from JACKRABBIT_LOG_LEVEL
    pub log_level: Option<String>,
    /// Output format from JACKRABBIT_FORMAT
    pub format: Option<String>,
    /// Colorized output from JACKRABBIT_COLOR
    pub color: Option<bool>,
    /// Config file from JACKRABBIT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from the process environment
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        Self {
            timeout: get("TIMEOUT").and_then(|v| v.parse().ok()),
            log_level: get("LOG_LEVEL"),
            format: get("FORMAT"),
            color: get("COLOR").map(|v| parse_bool(&v)),
            config_file: get("CONFIG"),
        }
    }

    /// Check if any override is set
    pub fn has_any(&self) -> bool {
        self.timeout.is_some()
            || self.log_level.is_some()
            || self.format.is_some()
            || self.color.is_some()
            || self.config_file.is_some()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
