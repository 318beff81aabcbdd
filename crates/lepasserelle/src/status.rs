//! RPC status codes
//!
//! The error side channel of the CostSource service. Every failed call
//! carries exactly one [`StatusCode`] plus a message.

use lecout::{CoutError, RpcMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result of one RPC call
pub type RpcResult<T> = Result<T, RpcStatus>;

/// Status codes surfaced at the RPC boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    /// Bad input: missing resource, invalid range, malformed token, over-limit batch
    InvalidArgument,
    /// No data for the query
    NotFound,
    /// Caller may not perform the call
    PermissionDenied,
    /// Transient outage
    Unavailable,
    /// Optional method not supported by the plugin
    Unimplemented,
    /// Unexpected failure
    Internal,
    /// Call deadline passed before a response
    DeadlineExceeded,
}

impl StatusCode {
    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::Unavailable => "UNAVAILABLE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Numeric code, gRPC numbering
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidArgument => 3,
            Self::DeadlineExceeded => 4,
            Self::NotFound => 5,
            Self::PermissionDenied => 7,
            Self::Unimplemented => 12,
            Self::Internal => 13,
            Self::Unavailable => 14,
        }
    }

    /// Parse a canonical name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        [
            Self::InvalidArgument,
            Self::NotFound,
            Self::PermissionDenied,
            Self::Unavailable,
            Self::Unimplemented,
            Self::Internal,
            Self::DeadlineExceeded,
        ]
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failed RPC call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct RpcStatus {
    /// Status code
    pub code: StatusCode,
    /// Human-readable description
    pub message: String,
    /// Optional structured details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RpcStatus {
    /// Create a status without details
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a status with structured details
    pub fn with_details(code: StatusCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// `INVALID_ARGUMENT`
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    /// `NOT_FOUND`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    /// `PERMISSION_DENIED`
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PermissionDenied, message)
    }

    /// `UNAVAILABLE`
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    /// `UNIMPLEMENTED` for an optional method
    pub fn unimplemented(method: RpcMethod) -> Self {
        Self::with_details(
            StatusCode::Unimplemented,
            format!("{method} is not implemented by this plugin"),
            serde_json::json!({ "method": method.as_str() }),
        )
    }

    /// `INTERNAL`
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    /// `DEADLINE_EXCEEDED`
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(StatusCode::DeadlineExceeded, message)
    }

    /// Bad input; never worth retrying
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code,
            StatusCode::InvalidArgument | StatusCode::NotFound | StatusCode::PermissionDenied
        )
    }

    /// Outage or timeout that may clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code,
            StatusCode::Unavailable | StatusCode::DeadlineExceeded
        )
    }

    /// Optional method not supported
    pub fn is_unimplemented(&self) -> bool {
        self.code == StatusCode::Unimplemented
    }
}

impl From<CoutError> for RpcStatus {
    fn from(err: CoutError) -> Self {
        let field = err.field().map(str::to_string);
        let message = err.to_string();
        match field {
            Some(field) => Self::with_details(
                StatusCode::InvalidArgument,
                message,
                serde_json::json!({ "field": field }),
            ),
            None => Self::invalid_argument(message),
        }
    }
}
