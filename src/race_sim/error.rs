//! Error - Config loading and race command failures
//!
//! Simulation steps never fail; only loading a configuration and commands
//! addressed to a specific car return these.

use thiserror::Error;

/// Errors raised while loading or validating a `RaceConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::InvalidJson(e.to_string())
    }
}

/// Errors for commands addressed to a specific vehicle in a race
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceError {
    #[error("no vehicle with id {0}")]
    UnknownVehicle(u32),
    #[error("vehicle {0} is AI-controlled")]
    NotHuman(u32),
}
