// Error Types
//
// *L'Erreur* (The Error) - Failures that stop a conformance run outright.
// Individual check failures are results, not errors.

use lepasserelle::HarnessError;
use thiserror::Error;

/// Result type for conformance operations
pub type Result<T> = std::result::Result<T, ConformanceError>;

/// Errors that abort a run or a configuration load
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// The harness could not be started
    #[error("harness setup failed: {0}")]
    HarnessSetup(#[from] HarnessError),

    /// A configuration value is out of range
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Offending field, dotted path
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Two tests registered under one name
    #[error("a test named '{0}' is already registered")]
    DuplicateTest(String),

    /// The run produced a result that could not be serialised
    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

impl ConformanceError {
    /// Build an [`ConformanceError::InvalidConfig`]
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
