//! Typed errors for the configuration surface.
//!
//! Running a suite never fails: test failures, timeouts and stale events are
//! all reported as data. Only loading and saving configuration can go wrong.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Unknown log level: {0}")]
    UnknownLogLevel(String),

    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}
