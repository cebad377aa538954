//! Error types for the `bunch` binary.

use bunch_core::types::{BunchError, ConfigurationError};
use thiserror::Error;

use crate::config::ConfigError;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Run configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bunch generation failed.
    #[error("{0}")]
    Bunch(#[from] BunchError),

    /// Invalid command line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialisation failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigurationError> for CliError {
    fn from(err: ConfigurationError) -> Self {
        Self::Bunch(err.into())
    }
}

impl CliError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::invalid_argument("events must be positive");
        assert!(err.to_string().contains("events must be positive"));
    }

    #[test]
    fn test_configuration_error_is_bunch_error() {
        let err: CliError = ConfigurationError::UnknownDistribution("banana".to_string()).into();
        assert!(matches!(err, CliError::Bunch(BunchError::Configuration(_))));
        assert!(err.to_string().contains("banana"));
    }
}
