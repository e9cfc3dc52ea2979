//! Error types for groupctl-core

use groupctl_store::StoreError;
use thiserror::Error;

/// Result type alias for control operations
pub type Result<T> = std::result::Result<T, ControlError>;

/// Main error type for control operations
#[derive(Error, Debug)]
pub enum ControlError {
    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A control with this service name already exists
    #[error("Service already registered: {0}")]
    AlreadyRegistered(String),

    /// No control with this service name
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
