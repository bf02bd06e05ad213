//! Result and error types for Waymark.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Waymark operations
pub type WaymarkResult<T> = Result<T, WaymarkError>;

/// Errors that can occur in Waymark
#[derive(Debug, Error)]
pub enum WaymarkError {
    /// No configuration document exists for the requested environment
    #[error("environment {environment} not found (looked in {})", .dir.display())]
    ConfigNotFound {
        /// Requested environment identifier
        environment: String,
        /// Directory that was searched
        dir: PathBuf,
    },

    /// Configuration document exists but could not be parsed
    #[error("Invalid configuration in {}: {message}", .path.display())]
    ConfigInvalid {
        /// Offending document
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A second, different environment was requested after resolution
    #[error("environment {active} is already active, cannot switch to {requested}")]
    EnvironmentConflict {
        /// Environment resolved first
        active: String,
        /// Environment requested afterwards
        requested: String,
    },

    /// Awaiting an alias exceeded its timeout
    #[error("Timed out after {ms}ms waiting for @{alias}")]
    WaitTimeout {
        /// Alias that was awaited
        alias: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A polled page condition never became true
    #[error("Timed out after {ms}ms waiting for {condition}")]
    ConditionTimeout {
        /// Description of the condition
        condition: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A scenario assertion did not hold
    #[error("Assertion failed: {message}")]
    AssertionMismatch {
        /// Error message
        message: String,
    },

    /// `wait` was called for an alias that was never registered
    #[error("No interception registered for alias @{alias}")]
    AliasNotRegistered {
        /// Alias that was awaited
        alias: String,
    },

    /// Path pattern could not be parsed
    #[error("Invalid path pattern {pattern}: {message}")]
    InvalidPattern {
        /// Pattern text
        pattern: String,
        /// Error message
        message: String,
    },

    /// HTTP method could not be parsed
    #[error("Unknown HTTP method: {method}")]
    InvalidMethod {
        /// Method text
        method: String,
    },

    /// Unknown synthetic data kind
    #[error("Unknown synthetic data kind: {kind}")]
    UnknownKind {
        /// Kind text
        kind: String,
    },

    /// Phone length bounds outside `1 <= min <= max <= MAX_PHONE_LEN`
    #[error("Invalid phone length bounds {min_len}..={max_len}")]
    InvalidPhoneBounds {
        /// Requested minimum
        min_len: usize,
        /// Requested maximum
        max_len: usize,
    },

    /// Page driver failure (visit, query, type, click)
    #[error("Page driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Backend failure while forwarding an intercepted call
    #[error("Backend error: {message}")]
    Backend {
        /// Error message
        message: String,
    },

    /// Fixture document not found
    #[error("Fixture not found: {name}")]
    FixtureNotFound {
        /// Fixture name
        name: String,
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

impl WaymarkError {
    /// Create an assertion mismatch
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionMismatch {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a backend error
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run rather than one scenario.
    ///
    /// Only configuration problems are run-fatal; everything else fails the
    /// current scenario and lets the suite continue.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::EnvironmentConflict { .. }
        )
    }
}
