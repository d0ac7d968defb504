//! Result and error types for smokecheck.
//!
//! Only two categories are meant to reach a test author: malformed queries
//! (a programming error in a page object) and timeouts from must-succeed
//! waits. Everything else is absorbed into result values by the layer that
//! observes it.

use thiserror::Error;

/// Result type for smokecheck operations
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Errors that can occur in smokecheck
#[derive(Debug, Error)]
pub enum SmokeError {
    /// The element query cannot be evaluated as written
    #[error("Malformed query '{query}': {reason}")]
    MalformedQuery {
        /// Query name
        query: String,
        /// What is wrong with it
        reason: String,
    },

    /// A must-succeed wait ran out of time
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Description of the awaited condition
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// An action targeted an element that could not be resolved
    #[error("Element not found: {query}")]
    ElementNotFound {
        /// Query name
        query: String,
    },

    /// The embedded document refused access (cross-origin, sandboxed)
    #[error("Frame unreachable: {reason}")]
    FrameUnreachable {
        /// Reason reported by the driver
        reason: String,
    },

    /// The frame element or its document went away during the lookup
    #[error("Frame detached")]
    FrameDetached,

    /// The driver cannot perform this operation
    #[error("Unsupported operation: {operation}")]
    Unsupported {
        /// Operation name
        operation: String,
    },

    /// The engine rejected a selector
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// Selector text
        selector: String,
        /// Engine message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SmokeError {
    /// Shorthand for a [`SmokeError::MalformedQuery`]
    pub fn malformed(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a programming error that must propagate
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedQuery { .. })
    }

    /// Whether this error describes a frame that cannot be entered
    #[must_use]
    pub const fn is_frame_failure(&self) -> bool {
        matches!(
            self,
            Self::FrameUnreachable { .. } | Self::FrameDetached | Self::Unsupported { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SmokeError::malformed("login_button", "no strategies");
        assert_eq!(
            err.to_string(),
            "Malformed query 'login_button': no strategies"
        );

        let err = SmokeError::Timeout {
            condition: "header visible".into(),
            ms: 30_000,
        };
        assert!(err.to_string().contains("30000ms"));
        assert!(err.to_string().contains("header visible"));
    }

    #[test]
    fn test_classification() {
        assert!(SmokeError::malformed("q", "r").is_malformed());
        assert!(!SmokeError::FrameDetached.is_malformed());
        assert!(SmokeError::FrameDetached.is_frame_failure());
        assert!(SmokeError::FrameUnreachable {
            reason: "cross-origin".into()
        }
        .is_frame_failure());
        assert!(SmokeError::Unsupported {
            operation: "direct frame".into()
        }
        .is_frame_failure());
        assert!(!SmokeError::ScriptError {
            message: "x".into()
        }
        .is_frame_failure());
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SmokeError = io.into();
        assert!(matches!(err, SmokeError::Io(_)));
    }
}
