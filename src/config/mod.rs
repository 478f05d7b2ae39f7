//! Configuration module
//!
//! Handles loading and managing runner configuration.

mod env;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::executor::DEFAULT_TIMEOUT_MS;
use crate::output::OutputFormat;
use crate::utils::LogLevel;

pub use env::EnvConfig;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Per-test timeout for collections that set none, in milliseconds
    pub default_timeout_ms: u64,

    pub log_level: LogLevel,

    /// Format used when printing results
    pub output_format: OutputFormat,

    /// Colorize table output
    pub colorize: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            log_level: LogLevel::Info,
            output_format: OutputFormat::Table,
            colorize: true,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: Result<Self, String> = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        };

        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides on top of this configuration
    pub fn with_env(mut self, env: &EnvConfig) -> Result<Self, ConfigError> {
        if let Some(timeout) = env.timeout {
            self.default_timeout_ms = timeout;
        }
        if let Some(level) = &env.log_level {
            self.log_level =
                LogLevel::parse(level).ok_or_else(|| ConfigError::UnknownLogLevel(level.clone()))?;
        }
        if let Some(format) = &env.format {
            self.output_format = OutputFormat::parse(format)
                .ok_or_else(|| ConfigError::UnknownFormat(format.clone()))?;
        }
        if let Some(color) = env.color {
            self.colorize = color;
        }
        Ok(self)
    }

    /// Load from `JACKRABBIT_CONFIG` when set, then apply environment overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = EnvConfig::load();
        let base = match &env.config_file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        base.with_env(&env)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
