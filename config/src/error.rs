//! Error types for configuration store operations

use std::path::PathBuf;
use thiserror::Error;

/// Configuration store errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration file given")]
    Missing,

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Configuration file is not readable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key name: {0:?}")]
    InvalidKey(String),

    #[error("Value of {key} cannot be stored: {reason}")]
    Unrepresentable { key: String, reason: &'static str },
}

impl ConfigError {
    /// Whether this error means the configuration file itself is unusable.
    ///
    /// Callers are expected to stop rather than continue with defaults when
    /// this returns true; the store has already logged the failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConfigError::Missing | ConfigError::NotFound(_) | ConfigError::Unreadable { .. }
        )
    }
}

/// Result type alias for configuration store operations
pub type Result<T> = std::result::Result<T, ConfigError>;
