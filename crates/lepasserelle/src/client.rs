// CostSource Client
//
// Typed async calls over the in-process transport. Each call runs the plugin
// on the blocking pool and is bounded by the client's call timeout.

use crate::protocol::RpcRequest;
use crate::status::{RpcResult, RpcStatus};
use crate::trace::TraceIdGenerator;
use crate::transport::InProcessTransport;
use lecout::messages::{
    EstimateCostRequest, EstimateCostResponse, GetActualCostRequest, GetActualCostResponse,
    GetBudgetsRequest, GetBudgetsResponse, GetPricingSpecRequest, GetPricingSpecResponse,
    GetProjectedCostRequest, GetProjectedCostResponse, GetRecommendationsRequest,
    GetRecommendationsResponse, NameRequest, NameResponse, SupportsRequest, SupportsResponse,
};
use lecout::RpcMethod;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default per-call timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Cheap-to-clone handle for calling a plugin
#[derive(Debug, Clone)]
pub struct CostSourceClient {
    transport: Arc<InProcessTransport>,
    call_timeout: Duration,
    trace_ids: Arc<TraceIdGenerator>,
}

impl CostSourceClient {
    /// Client over an open transport
    pub fn new(transport: Arc<InProcessTransport>) -> Self {
        Self {
            transport,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            trace_ids: Arc::new(TraceIdGenerator::new()),
        }
    }

    /// Same client with a different per-call timeout
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Per-call timeout
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Invoke `method` with a serialisable request.
    ///
    /// Timeouts surface as `DEADLINE_EXCEEDED`; a panicking plugin surfaces
    /// as `INTERNAL`.
    pub async fn call<Req, Resp>(&self, method: RpcMethod, request: &Req) -> RpcResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let trace_id = self.trace_ids.next_id();
        let payload = serde_json::to_value(request)
            .map_err(|e| RpcStatus::internal(format!("failed to encode {method} request: {e}")))?;
        let envelope =
            RpcRequest::new(method, trace_id.clone(), payload).with_timeout(self.call_timeout);

        let transport = Arc::clone(&self.transport);
        let started = Instant::now();
        let handle = tokio::task::spawn_blocking(move || transport.dispatch(envelope));

        let response = match tokio::time::timeout(self.call_timeout, handle).await {
            Ok(Ok(response)) => response,
            Ok(Err(join_err)) => {
                warn!(rpc_method = %method, trace_id = %trace_id, "plugin task failed: {}", join_err);
                return Err(RpcStatus::internal(format!("{method} handler failed: {join_err}")));
            }
            Err(_) => {
                debug!(
                    rpc_method = %method,
                    trace_id = %trace_id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "call timed out"
                );
                return Err(RpcStatus::deadline_exceeded(format!(
                    "{method} did not respond within {}ms",
                    self.call_timeout.as_millis()
                )));
            }
        };

        debug!(
            rpc_method = %method,
            trace_id = %trace_id,
            duration_ms = started.elapsed().as_millis() as u64,
            "call completed"
        );

        if response.trace_id != trace_id {
            return Err(RpcStatus::internal(format!(
                "trace id mismatch: sent {trace_id}, received {}",
                response.trace_id
            )));
        }
        response.into_result()
    }

    /// `Name`
    pub async fn name(&self) -> RpcResult<NameResponse> {
        self.call(RpcMethod::Name, &NameRequest {}).await
    }

    /// `Supports`
    pub async fn supports(&self, req: &SupportsRequest) -> RpcResult<SupportsResponse> {
        self.call(RpcMethod::Supports, req).await
    }

    /// `GetActualCost`
    pub async fn get_actual_cost(
        &self,
        req: &GetActualCostRequest,
    ) -> RpcResult<GetActualCostResponse> {
        self.call(RpcMethod::GetActualCost, req).await
    }

    /// `GetProjectedCost`
    pub async fn get_projected_cost(
        &self,
        req: &GetProjectedCostRequest,
    ) -> RpcResult<GetProjectedCostResponse> {
        self.call(RpcMethod::GetProjectedCost, req).await
    }

    /// `GetPricingSpec`
    pub async fn get_pricing_spec(
        &self,
        req: &GetPricingSpecRequest,
    ) -> RpcResult<GetPricingSpecResponse> {
        self.call(RpcMethod::GetPricingSpec, req).await
    }

    /// `GetRecommendations`
    pub async fn get_recommendations(
        &self,
        req: &GetRecommendationsRequest,
    ) -> RpcResult<GetRecommendationsResponse> {
        self.call(RpcMethod::GetRecommendations, req).await
    }

    /// `GetBudgets`
    pub async fn get_budgets(&self, req: &GetBudgetsRequest) -> RpcResult<GetBudgetsResponse> {
        self.call(RpcMethod::GetBudgets, req).await
    }

    /// `EstimateCost`
    pub async fn estimate_cost(
        &self,
        req: &EstimateCostRequest,
    ) -> RpcResult<EstimateCostResponse> {
        self.call(RpcMethod::EstimateCost, req).await
    }
}
