// Conformance Checks
//
// The built-in check catalogue, grouped by category. Every check takes an
// owned `CheckContext` and reports a `CheckOutcome`; none of them panics on a
// misbehaving plugin.

mod concurrency;
mod performance;
mod rpc_correctness;
mod spec_validation;

use crate::config::ConformanceConfig;
use crate::error::Result;
use crate::suite::{CheckContext, CheckOutcome, ConformanceSuite, ConformanceSuiteTest};
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use lecout::messages::{
    EstimateCostRequest, GetActualCostRequest, GetBudgetsRequest, GetPricingSpecRequest,
    GetProjectedCostRequest, GetRecommendationsRequest, SupportsRequest,
};
use lecout::{ResourceDescriptor, RpcMethod};
use lepasserelle::{CostSourceClient, RpcResult, StatusCode};
use serde::Serialize;

/// Every built-in check, in registration order
pub fn all() -> Vec<ConformanceSuiteTest> {
    let mut tests = spec_validation::tests();
    tests.extend(rpc_correctness::tests());
    tests.extend(performance::tests());
    tests.extend(concurrency::tests());
    tests
}

/// Register every built-in check
pub fn register_all(suite: &mut ConformanceSuite) -> Result<()> {
    for test in all() {
        suite.register(test)?;
    }
    Ok(())
}

/// Suite with every built-in check registered
pub fn standard_suite(config: ConformanceConfig) -> Result<ConformanceSuite> {
    let mut suite = ConformanceSuite::with_config(config);
    register_all(&mut suite)?;
    Ok(suite)
}

/// Resource every plugin under test is expected to price
pub(crate) fn sample_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("aws", "ec2")
        .with_sku("t3.medium")
        .with_region("us-east-1")
        .with_id("conformance-sample")
}

/// Resource no plugin is expected to price
pub(crate) fn unknown_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("conformance", "nonexistent-type")
}

/// Resource id used for actual-cost queries
pub(crate) const SAMPLE_RESOURCE_ID: &str = "i-0conformance";

/// The `days` whole days ending at today's midnight (UTC)
pub(crate) fn recent_range(days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN);
    let end = Utc.from_utc_datetime(&midnight);
    (end - ChronoDuration::days(days), end)
}

/// Pass with an explanation when `method` is not implemented
pub(crate) fn unless_implemented(ctx: &CheckContext, method: RpcMethod) -> Option<CheckOutcome> {
    if ctx.capabilities.supports(method) {
        None
    } else {
        Some(not_implemented(method))
    }
}

pub(crate) fn not_implemented(method: RpcMethod) -> CheckOutcome {
    CheckOutcome::pass().with_detail(format!(
        "{method} is not implemented by this plugin; optional, treated as pass"
    ))
}

/// Expect a client-error rejection
pub(crate) fn expect_invalid_argument<T>(result: RpcResult<T>, what: &str) -> CheckOutcome {
    match result {
        Err(status) if status.code == StatusCode::InvalidArgument => {
            CheckOutcome::pass().with_detail(format!("{what}: {}", status.message))
        }
        Err(status) => CheckOutcome::fail(format!(
            "{what}: expected INVALID_ARGUMENT, got {}",
            status.code
        )),
        Ok(_) => CheckOutcome::fail(format!("{what}: expected INVALID_ARGUMENT, call succeeded")),
    }
}

/// One valid call of `method`; the response is discarded
pub(crate) async fn invoke(client: &CostSourceClient, method: RpcMethod) -> RpcResult<()> {
    match method {
        RpcMethod::Name => client.name().await.map(drop),
        RpcMethod::Supports => client
            .supports(&SupportsRequest {
                resource: Some(sample_resource()),
            })
            .await
            .map(drop),
        RpcMethod::GetActualCost => {
            let (start, end) = recent_range(7);
            client
                .get_actual_cost(&GetActualCostRequest {
                    resource_id: SAMPLE_RESOURCE_ID.to_string(),
                    start: Some(start),
                    end: Some(end),
                    ..GetActualCostRequest::default()
                })
                .await
                .map(drop)
        }
        RpcMethod::GetProjectedCost => client
            .get_projected_cost(&GetProjectedCostRequest {
                resource: Some(sample_resource()),
            })
            .await
            .map(drop),
        RpcMethod::GetPricingSpec => client
            .get_pricing_spec(&GetPricingSpecRequest {
                resource: Some(sample_resource()),
            })
            .await
            .map(drop),
        RpcMethod::GetRecommendations => client
            .get_recommendations(&GetRecommendationsRequest {
                page_size: 10,
                ..GetRecommendationsRequest::default()
            })
            .await
            .map(drop),
        RpcMethod::GetBudgets => client
            .get_budgets(&GetBudgetsRequest {
                filter: None,
                include_status: true,
            })
            .await
            .map(drop),
        RpcMethod::EstimateCost => client
            .estimate_cost(&sample_estimate_request())
            .await
            .map(drop),
    }
}

pub(crate) fn sample_estimate_request() -> EstimateCostRequest {
    let mut request = EstimateCostRequest {
        resource_type: "aws:ec2/instance:Instance".to_string(),
        ..EstimateCostRequest::default()
    };
    request
        .attributes
        .insert("instanceType".to_string(), serde_json::Value::from("t3.micro"));
    request
}

/// blake3 digest of a response's JSON encoding
pub(crate) fn digest<T: Serialize>(value: &T) -> std::result::Result<String, String> {
    let bytes = serde_json::to_vec(value).map_err(|e| format!("response not serialisable: {e}"))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
