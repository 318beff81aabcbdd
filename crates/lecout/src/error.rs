// Error Handling
//
// *L'Erreur* (The Error) - Typed errors for malformed cost-source input

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for lecout operations
pub type Result<T> = std::result::Result<T, CoutError>;

/// Errors raised by the pure query core
///
/// Every variant describes bad client input. Degenerate-but-valid states
/// (empty result sets, offsets past the end) are never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoutError {
    /// Page token is present but does not decode to an offset
    #[error("invalid page token '{token}': {reason}")]
    InvalidToken {
        /// The token as received
        token: String,
        /// Why decoding failed
        reason: String,
    },

    /// A required field is missing or a field has an unusable value
    #[error("invalid field '{field}': {message}")]
    Validation {
        /// Field path, e.g. `resource.provider`
        field: String,
        /// Human-readable explanation
        message: String,
    },

    /// Batch scope larger than allowed
    #[error("too many target resources: {count} exceeds limit of {limit}")]
    TooManyTargets {
        /// Number of targets supplied
        count: usize,
        /// Maximum accepted
        limit: usize,
    },

    /// Time range whose end precedes its start
    #[error("invalid time range: end {end} is before start {start}")]
    InvalidTimeRange {
        /// Range start
        start: DateTime<Utc>,
        /// Range end
        end: DateTime<Utc>,
    },
}

impl CoutError {
    /// Create an invalid token error
    pub fn invalid_token(token: impl Into<String>, reason: impl Into<String>) -> Self {
        CoutError::InvalidToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error for a field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoutError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Field the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CoutError::Validation { field, .. } => Some(field),
            CoutError::InvalidToken { .. } => Some("page_token"),
            CoutError::TooManyTargets { .. } => Some("target_resources"),
            CoutError::InvalidTimeRange { .. } => Some("end"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = CoutError::validation("resource.provider", "is required");
        assert_eq!(
            err.to_string(),
            "invalid field 'resource.provider': is required"
        );
        assert_eq!(err.field(), Some("resource.provider"));
    }

    #[test]
    fn test_token_error_names_field() {
        let err = CoutError::invalid_token("@@", "not base64");
        assert!(err.to_string().contains("@@"));
        assert_eq!(err.field(), Some("page_token"));
    }
}
