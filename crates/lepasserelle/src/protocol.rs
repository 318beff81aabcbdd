// RPC Envelope Types
//
// Requests and responses cross the in-process transport as JSON envelopes,
// so plugins see the same serialisation boundary a network transport imposes.

use crate::status::{RpcResult, RpcStatus};
use lecout::RpcMethod;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Envelope format version
pub const PROTOCOL_VERSION: &str = "costsource/1";

/// Request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Envelope format version
    pub version: String,
    /// Method being invoked
    pub method: RpcMethod,
    /// Trace id echoed in the response
    pub trace_id: String,
    /// Relative deadline, applied when the transport receives the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Serialised request message
    pub payload: Value,
}

impl RpcRequest {
    /// Build a request envelope
    pub fn new(method: RpcMethod, trace_id: impl Into<String>, payload: Value) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            method,
            trace_id: trace_id.into(),
            timeout_ms: None,
            payload,
        }
    }

    /// Attach a relative deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Check the envelope version
    pub fn validate(&self) -> RpcResult<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(RpcStatus::invalid_argument(format!(
                "unsupported protocol version: {}",
                self.version
            )));
        }
        Ok(())
    }
}

/// Response envelope: either a payload or a status, never both
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Trace id from the request
    pub trace_id: String,
    /// Serialised response message on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Error status on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RpcStatus>,
}

impl RpcResponse {
    /// Successful response
    pub fn success(trace_id: impl Into<String>, payload: Value) -> Self {
        Self {
            trace_id: trace_id.into(),
            payload: Some(payload),
            status: None,
        }
    }

    /// Failed response
    pub fn error(trace_id: impl Into<String>, status: RpcStatus) -> Self {
        Self {
            trace_id: trace_id.into(),
            payload: None,
            status: Some(status),
        }
    }

    /// Build from a handler result
    pub fn from_result(trace_id: impl Into<String>, result: RpcResult<Value>) -> Self {
        match result {
            Ok(payload) => Self::success(trace_id, payload),
            Err(status) => Self::error(trace_id, status),
        }
    }

    /// Decode the payload into a typed message, or surface the status
    pub fn into_result<T: DeserializeOwned>(self) -> RpcResult<T> {
        if let Some(status) = self.status {
            return Err(status);
        }
        let payload = self
            .payload
            .ok_or_else(|| RpcStatus::internal("response carried neither payload nor status"))?;
        serde_json::from_value(payload)
            .map_err(|e| RpcStatus::internal(format!("failed to decode response payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;
    use lecout::messages::NameResponse;

    #[test]
    fn test_request_envelope_roundtrip() {
        let req = RpcRequest::new(RpcMethod::GetBudgets, "abc", serde_json::json!({}))
            .with_timeout(Duration::from_millis(250));
        let json = serde_json::to_string(&req).unwrap();
        let back: RpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, RpcMethod::GetBudgets);
        assert_eq!(back.timeout_ms, Some(250));
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut req = RpcRequest::new(RpcMethod::Name, "abc", Value::Null);
        req.version = "costsource/0".to_string();
        assert_eq!(req.validate().unwrap_err().code, StatusCode::InvalidArgument);
    }

    #[test]
    fn test_response_decoding() {
        let ok = RpcResponse::success("t", serde_json::json!({"name": "mock"}));
        let name: NameResponse = ok.into_result().unwrap();
        assert_eq!(name.name, "mock");

        let err = RpcResponse::error("t", RpcStatus::unavailable("down"));
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("payload"));
        let decoded: RpcResult<NameResponse> = err.into_result();
        assert_eq!(decoded.unwrap_err().code, StatusCode::Unavailable);
    }
}
