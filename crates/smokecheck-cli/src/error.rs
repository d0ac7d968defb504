//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// One or more scenarios did not pass
    #[error("Scenario run failed: {message}")]
    ScenarioFailed {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Smokecheck library error
    #[error("Smokecheck error: {0}")]
    Smoke(#[from] smokecheck::SmokeError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a scenario failure
    #[must_use]
    pub fn scenario_failed(message: impl Into<String>) -> Self {
        Self::ScenarioFailed {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_scenario_failed_error() {
        let err = CliError::scenario_failed("1 of 3 scenarios failed");
        assert!(err.to_string().contains("Scenario run failed"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_from_smoke_error() {
        let err: CliError = smokecheck::SmokeError::Timeout {
            condition: "header_container visible".to_string(),
            ms: 30_000,
        }
        .into();
        assert!(matches!(err, CliError::Smoke(_)));
        assert!(err.to_string().contains("30000ms"));
    }

    #[test]
    fn test_from_io_error() {
        let err: CliError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(err.to_string().contains("I/O error"));
    }
}
