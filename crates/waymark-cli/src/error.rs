//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Waymark library error, reported verbatim
    #[error(transparent)]
    Waymark(#[from] waymark::WaymarkError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_library_errors_are_transparent() {
        let err: CliError = waymark::WaymarkError::ConfigNotFound {
            environment: "qa".to_string(),
            dir: PathBuf::from("config"),
        }
        .into();
        assert_eq!(err.to_string(), "environment qa not found (looked in config)");
    }

    #[test]
    fn test_invalid_argument() {
        let err = CliError::invalid_argument("--count must be at least 1");
        assert!(err.to_string().starts_with("Invalid argument"));
    }
}
