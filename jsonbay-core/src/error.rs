use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, std::io::Error),

    #[error("Failed to write file {0}: {1}")]
    FileWrite(PathBuf, std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid route path: '{0}'. Route paths must start with '/'")]
    InvalidRoutePath(String),

    #[error("Invalid log level '{0}' (expected 'info' or 'debug')")]
    InvalidLogLevel(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
