// Plugin Contract
//
// The CostSource service surface a plugin implements. Core methods are
// required; the extended subset defaults to `UNIMPLEMENTED` so a plugin only
// overrides what it supports.

use crate::status::{RpcResult, RpcStatus};
use lecout::messages::{
    EstimateCostRequest, EstimateCostResponse, GetActualCostRequest, GetActualCostResponse,
    GetBudgetsRequest, GetBudgetsResponse, GetPricingSpecRequest, GetPricingSpecResponse,
    GetProjectedCostRequest, GetProjectedCostResponse, GetRecommendationsRequest,
    GetRecommendationsResponse, NameResponse, SupportsRequest, SupportsResponse,
};
use lecout::RpcMethod;
use std::time::{Duration, Instant};

/// Per-call context handed to the plugin alongside the request
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Method being served
    pub method: RpcMethod,
    /// Trace id of the call
    pub trace_id: String,
    /// Absolute deadline, if the caller set one
    pub deadline: Option<Instant>,
}

impl CallContext {
    /// Context without a deadline
    pub fn new(method: RpcMethod, trace_id: impl Into<String>) -> Self {
        Self {
            method,
            trace_id: trace_id.into(),
            deadline: None,
        }
    }

    /// Set the deadline relative to now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    /// Time left before the deadline; `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Block for `duration`, giving up at the deadline.
    ///
    /// Returns `DEADLINE_EXCEEDED` when the deadline falls inside the wait.
    pub fn sleep(&self, duration: Duration) -> RpcResult<()> {
        match self.remaining() {
            Some(left) if left < duration => {
                std::thread::sleep(left);
                Err(RpcStatus::deadline_exceeded(format!(
                    "{} deadline exceeded after {}ms",
                    self.method,
                    left.as_millis()
                )))
            }
            _ => {
                std::thread::sleep(duration);
                Ok(())
            }
        }
    }
}

/// A CostSource plugin.
///
/// Calls may arrive concurrently from many tasks, so implementations must be
/// safe to share and must not rely on call order.
pub trait CostSourcePlugin: Send + Sync {
    /// Plugin identity
    fn name(&self, ctx: &CallContext) -> RpcResult<NameResponse>;

    /// Whether the plugin can price a resource
    fn supports(&self, ctx: &CallContext, req: SupportsRequest) -> RpcResult<SupportsResponse>;

    /// Historical cost for one resource
    fn get_actual_cost(
        &self,
        ctx: &CallContext,
        req: GetActualCostRequest,
    ) -> RpcResult<GetActualCostResponse>;

    /// Projected monthly cost for one resource
    fn get_projected_cost(
        &self,
        ctx: &CallContext,
        req: GetProjectedCostRequest,
    ) -> RpcResult<GetProjectedCostResponse>;

    /// Pricing specification for one resource
    fn get_pricing_spec(
        &self,
        ctx: &CallContext,
        req: GetPricingSpecRequest,
    ) -> RpcResult<GetPricingSpecResponse>;

    /// Optimization recommendations
    fn get_recommendations(
        &self,
        _ctx: &CallContext,
        _req: GetRecommendationsRequest,
    ) -> RpcResult<GetRecommendationsResponse> {
        Err(RpcStatus::unimplemented(RpcMethod::GetRecommendations))
    }

    /// Spending budgets
    fn get_budgets(
        &self,
        _ctx: &CallContext,
        _req: GetBudgetsRequest,
    ) -> RpcResult<GetBudgetsResponse> {
        Err(RpcStatus::unimplemented(RpcMethod::GetBudgets))
    }

    /// Monthly estimate from a resource type token and attributes
    fn estimate_cost(
        &self,
        _ctx: &CallContext,
        _req: EstimateCostRequest,
    ) -> RpcResult<EstimateCostResponse> {
        Err(RpcStatus::unimplemented(RpcMethod::EstimateCost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    struct CoreOnly;

    impl CostSourcePlugin for CoreOnly {
        fn name(&self, _ctx: &CallContext) -> RpcResult<NameResponse> {
            Ok(NameResponse {
                name: "core-only".to_string(),
            })
        }

        fn supports(&self, _ctx: &CallContext, _req: SupportsRequest) -> RpcResult<SupportsResponse> {
            Ok(SupportsResponse::default())
        }

        fn get_actual_cost(
            &self,
            _ctx: &CallContext,
            _req: GetActualCostRequest,
        ) -> RpcResult<GetActualCostResponse> {
            Err(RpcStatus::not_found("no data"))
        }

        fn get_projected_cost(
            &self,
            _ctx: &CallContext,
            _req: GetProjectedCostRequest,
        ) -> RpcResult<GetProjectedCostResponse> {
            Err(RpcStatus::not_found("no data"))
        }

        fn get_pricing_spec(
            &self,
            _ctx: &CallContext,
            _req: GetPricingSpecRequest,
        ) -> RpcResult<GetPricingSpecResponse> {
            Err(RpcStatus::not_found("no data"))
        }
    }

    #[test]
    fn test_optional_methods_default_to_unimplemented() {
        let plugin = CoreOnly;
        let ctx = CallContext::new(RpcMethod::GetBudgets, "t");
        let err = plugin
            .get_budgets(&ctx, GetBudgetsRequest::default())
            .unwrap_err();
        assert_eq!(err.code, StatusCode::Unimplemented);
        assert!(plugin
            .estimate_cost(&ctx, EstimateCostRequest::default())
            .unwrap_err()
            .is_unimplemented());
    }

    #[test]
    fn test_sleep_without_deadline_completes() {
        let ctx = CallContext::new(RpcMethod::Name, "t");
        assert!(ctx.remaining().is_none());
        assert!(ctx.sleep(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn test_sleep_past_deadline_fails() {
        let ctx = CallContext::new(RpcMethod::Name, "t").with_timeout(Duration::from_millis(5));
        let err = ctx.sleep(Duration::from_millis(200)).unwrap_err();
        assert_eq!(err.code, StatusCode::DeadlineExceeded);
        assert!(ctx.is_expired());
    }
}
