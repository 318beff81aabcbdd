// lepasserelle - Plugin Bridge
//
// *La Passerelle* (The Bridge) - Connects a CostSource plugin implementation to
// an in-process client through a serialising RPC transport, and manages the
// harness lifecycle around it.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Typed async client over the transport
pub mod client;
/// Harness lifecycle and capability probing
pub mod harness;
/// Plugin trait and per-call context
pub mod plugin;
/// Request/response envelopes
pub mod protocol;
/// gRPC-style status codes
pub mod status;
/// Trace id generation and validation
pub mod trace;
/// In-process serialising transport
pub mod transport;

pub use client::CostSourceClient;
pub use harness::{CapabilitySet, HarnessConfig, HarnessError, HarnessState, TestHarness};
pub use plugin::{CallContext, CostSourcePlugin};
pub use protocol::{RpcRequest, RpcResponse};
pub use status::{RpcResult, RpcStatus, StatusCode};
pub use trace::{is_valid_trace_id, TraceIdGenerator};
pub use transport::InProcessTransport;

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
