// In-Process Transport
//
// Decodes a request envelope, invokes the plugin, and encodes the response.
// Payloads round-trip through JSON exactly as they would over a socket, so a
// plugin that returns unserialisable data fails here rather than in the suite.

use crate::plugin::{CallContext, CostSourcePlugin};
use crate::protocol::{RpcRequest, RpcResponse};
use crate::status::{RpcResult, RpcStatus};
use lecout::RpcMethod;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Serialising transport in front of one plugin
pub struct InProcessTransport {
    plugin: Arc<dyn CostSourcePlugin>,
    open: AtomicBool,
}

impl InProcessTransport {
    /// Transport over `plugin`, initially closed
    pub fn new(plugin: Arc<dyn CostSourcePlugin>) -> Self {
        Self {
            plugin,
            open: AtomicBool::new(false),
        }
    }

    /// Start accepting calls
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Stop accepting calls; later requests fail with `UNAVAILABLE`
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Whether calls are accepted
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Serve one request envelope. Blocks for as long as the plugin does.
    pub fn dispatch(&self, request: RpcRequest) -> RpcResponse {
        let trace_id = request.trace_id.clone();

        if !self.is_open() {
            return RpcResponse::error(trace_id, RpcStatus::unavailable("transport is closed"));
        }
        if let Err(status) = request.validate() {
            return RpcResponse::error(trace_id, status);
        }

        let mut ctx = CallContext::new(request.method, trace_id.clone());
        if let Some(ms) = request.timeout_ms {
            ctx = ctx.with_timeout(Duration::from_millis(ms));
        }

        let result = self.route(&ctx, request.payload);
        if let Err(status) = &result {
            if status.is_unimplemented() {
                debug!(rpc_method = %ctx.method, trace_id = %trace_id, "method not implemented");
            } else {
                debug!(
                    rpc_method = %ctx.method,
                    trace_id = %trace_id,
                    error_code = %status.code,
                    "plugin returned error"
                );
            }
        }
        RpcResponse::from_result(trace_id, result)
    }

    fn route(&self, ctx: &CallContext, payload: Value) -> RpcResult<Value> {
        let plugin = self.plugin.as_ref();
        match ctx.method {
            RpcMethod::Name => handle(ctx, payload, |c, _: lecout::messages::NameRequest| {
                plugin.name(c)
            }),
            RpcMethod::Supports => handle(ctx, payload, |c, req: lecout::messages::SupportsRequest| {
                plugin.supports(c, req)
            }),
            RpcMethod::GetActualCost => {
                handle(ctx, payload, |c, req: lecout::messages::GetActualCostRequest| {
                    plugin.get_actual_cost(c, req)
                })
            }
            RpcMethod::GetProjectedCost => {
                handle(ctx, payload, |c, req: lecout::messages::GetProjectedCostRequest| {
                    plugin.get_projected_cost(c, req)
                })
            }
            RpcMethod::GetPricingSpec => {
                handle(ctx, payload, |c, req: lecout::messages::GetPricingSpecRequest| {
                    plugin.get_pricing_spec(c, req)
                })
            }
            RpcMethod::GetRecommendations => {
                handle(ctx, payload, |c, req: lecout::messages::GetRecommendationsRequest| {
                    plugin.get_recommendations(c, req)
                })
            }
            RpcMethod::GetBudgets => {
                handle(ctx, payload, |c, req: lecout::messages::GetBudgetsRequest| {
                    plugin.get_budgets(c, req)
                })
            }
            RpcMethod::EstimateCost => {
                handle(ctx, payload, |c, req: lecout::messages::EstimateCostRequest| {
                    plugin.estimate_cost(c, req)
                })
            }
        }
    }
}

fn handle<Req, Resp, F>(ctx: &CallContext, payload: Value, f: F) -> RpcResult<Value>
where
    Req: DeserializeOwned,
    Resp: Serialize,
    F: FnOnce(&CallContext, Req) -> RpcResult<Resp>,
{
    let payload = if payload.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        payload
    };
    let request: Req = serde_json::from_value(payload).map_err(|e| {
        RpcStatus::invalid_argument(format!("malformed {} request: {e}", ctx.method))
    })?;
    let response = f(ctx, request)?;
    serde_json::to_value(response).map_err(|e| {
        warn!(rpc_method = %ctx.method, trace_id = %ctx.trace_id, "failed to encode response: {}", e);
        RpcStatus::internal(format!("failed to encode {} response: {e}", ctx.method))
    })
}

impl std::fmt::Debug for InProcessTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessTransport")
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
