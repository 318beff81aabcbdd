// Spec Validation Checks
//
// Response shapes: required fields present, currencies and billing modes
// well-formed, summaries consistent with the records they describe.

use super::{
    recent_range, sample_estimate_request, sample_resource, unknown_resource, unless_implemented,
    SAMPLE_RESOURCE_ID,
};
use crate::level::{ConformanceLevel, TestCategory};
use crate::suite::{CheckContext, CheckOutcome, ConformanceSuiteTest};
use lecout::messages::{
    BudgetSummary, GetActualCostRequest, GetBudgetsRequest, GetPricingSpecRequest,
    GetProjectedCostRequest, GetRecommendationsRequest, SupportsRequest,
};
use lecout::model::billing_mode;
use lecout::validate::{is_valid_currency, pricing_spec_violations};
use lecout::{BudgetHealth, FallbackHint, RpcMethod};
use lepasserelle::StatusCode;
use std::collections::HashSet;

const TOLERANCE: f64 = 1e-6;

pub(super) fn tests() -> Vec<ConformanceSuiteTest> {
    use ConformanceLevel::{Basic, Standard};
    use TestCategory::SpecValidation;

    vec![
        ConformanceSuiteTest::new(
            "name_is_reported",
            "Name returns a non-empty plugin name",
            SpecValidation,
            Basic,
            name_is_reported,
        ),
        ConformanceSuiteTest::new(
            "pricing_spec_schema",
            "GetPricingSpec returns a well-formed spec for a supported resource",
            SpecValidation,
            Basic,
            pricing_spec_schema,
        ),
        ConformanceSuiteTest::new(
            "projected_cost_fields",
            "GetProjectedCost returns a currency, non-negative prices and a billing detail",
            SpecValidation,
            Basic,
            projected_cost_fields,
        ),
        ConformanceSuiteTest::new(
            "actual_cost_schema",
            "GetActualCost returns finite costs inside the requested range",
            SpecValidation,
            Basic,
            actual_cost_schema,
        ),
        ConformanceSuiteTest::new(
            "pricing_spec_unknown_type",
            "GetPricingSpec degrades gracefully for an unknown resource type",
            SpecValidation,
            Standard,
            pricing_spec_unknown_type,
        ),
        ConformanceSuiteTest::new(
            "recommendation_schema",
            "GetRecommendations returns unique ids, bounded confidence and a consistent summary",
            SpecValidation,
            Standard,
            recommendation_schema,
        ),
        ConformanceSuiteTest::new(
            "budget_schema",
            "GetBudgets returns health matching usage and a summary matching the budgets",
            SpecValidation,
            Standard,
            budget_schema,
        ),
        ConformanceSuiteTest::new(
            "estimate_cost_schema",
            "EstimateCost returns a non-negative monthly cost with a currency",
            SpecValidation,
            Standard,
            estimate_cost_schema,
        ),
    ]
}

async fn name_is_reported(ctx: CheckContext) -> CheckOutcome {
    match ctx.client.name().await {
        Ok(resp) if resp.name.trim().is_empty() => CheckOutcome::fail("Name returned an empty name"),
        Ok(resp) => CheckOutcome::pass().with_detail(format!("plugin name: {}", resp.name)),
        Err(status) => CheckOutcome::fail(format!("Name failed: {status}")),
    }
}

/// Whether the plugin claims the sample resource
async fn sample_supported(ctx: &CheckContext) -> Result<bool, CheckOutcome> {
    let request = SupportsRequest {
        resource: Some(sample_resource()),
    };
    match ctx.client.supports(&request).await {
        Ok(resp) => Ok(resp.supported),
        Err(status) => Err(CheckOutcome::fail(format!("Supports failed: {status}"))),
    }
}

async fn pricing_spec_schema(ctx: CheckContext) -> CheckOutcome {
    let resource = sample_resource();
    let request = GetPricingSpecRequest {
        resource: Some(resource.clone()),
    };
    let spec = match ctx.client.get_pricing_spec(&request).await {
        Ok(resp) => resp.spec,
        Err(status) => return CheckOutcome::fail(format!("GetPricingSpec failed: {status}")),
    };

    let mut problems = pricing_spec_violations(&spec);
    if spec.billing_mode != billing_mode::NOT_IMPLEMENTED {
        if spec.provider != resource.provider {
            problems.push(format!(
                "provider '{}' does not echo the request '{}'",
                spec.provider, resource.provider
            ));
        }
        if spec.resource_type != resource.resource_type {
            problems.push(format!(
                "resource_type '{}' does not echo the request '{}'",
                spec.resource_type, resource.resource_type
            ));
        }
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("billing_mode: {}", spec.billing_mode))
}

async fn pricing_spec_unknown_type(ctx: CheckContext) -> CheckOutcome {
    let request = GetPricingSpecRequest {
        resource: Some(unknown_resource()),
    };
    match ctx.client.get_pricing_spec(&request).await {
        Ok(resp) => {
            let outcome = CheckOutcome::from_problems(pricing_spec_violations(&resp.spec));
            if resp.spec.billing_mode == billing_mode::NOT_IMPLEMENTED {
                outcome.with_detail("unknown type answered with a not_implemented spec")
            } else {
                outcome.with_detail(format!(
                    "unknown type priced as {}",
                    resp.spec.billing_mode
                ))
            }
        }
        Err(status)
            if matches!(
                status.code,
                StatusCode::NotFound | StatusCode::InvalidArgument
            ) =>
        {
            CheckOutcome::pass().with_detail(format!("unknown type rejected with {}", status.code))
        }
        Err(status) => CheckOutcome::fail(format!(
            "unknown type should yield a not_implemented spec or NOT_FOUND, got {status}"
        )),
    }
}

async fn projected_cost_fields(ctx: CheckContext) -> CheckOutcome {
    match sample_supported(&ctx).await {
        Ok(true) => {}
        Ok(false) => {
            return CheckOutcome::pass().with_detail("sample resource not supported; nothing to project")
        }
        Err(outcome) => return outcome,
    }

    let request = GetProjectedCostRequest {
        resource: Some(sample_resource()),
    };
    let resp = match ctx.client.get_projected_cost(&request).await {
        Ok(resp) => resp,
        Err(status) => return CheckOutcome::fail(format!("GetProjectedCost failed: {status}")),
    };

    let mut problems = Vec::new();
    if !is_valid_currency(&resp.currency) {
        problems.push(format!("currency '{}' is not an ISO 4217 code", resp.currency));
    }
    if !resp.unit_price.is_finite() || resp.unit_price < 0.0 {
        problems.push(format!("unit_price {} is negative or not finite", resp.unit_price));
    }
    if !resp.cost_per_month.is_finite() || resp.cost_per_month < 0.0 {
        problems.push(format!(
            "cost_per_month {} is negative or not finite",
            resp.cost_per_month
        ));
    }
    if resp.billing_detail.trim().is_empty() {
        problems.push("billing_detail is empty".to_string());
    }

    CheckOutcome::from_problems(problems).with_detail(format!(
        "{:.4} {}/month ({})",
        resp.cost_per_month, resp.currency, resp.billing_detail
    ))
}

async fn actual_cost_schema(ctx: CheckContext) -> CheckOutcome {
    let (start, end) = recent_range(7);
    let request = GetActualCostRequest {
        resource_id: SAMPLE_RESOURCE_ID.to_string(),
        start: Some(start),
        end: Some(end),
        ..GetActualCostRequest::default()
    };
    let resp = match ctx.client.get_actual_cost(&request).await {
        Ok(resp) => resp,
        Err(status) if status.code == StatusCode::NotFound => {
            return CheckOutcome::pass().with_detail("no cost data for the sample resource")
        }
        Err(status) => return CheckOutcome::fail(format!("GetActualCost failed: {status}")),
    };

    let mut problems = Vec::new();
    for point in &resp.results {
        if !point.cost.is_finite() {
            problems.push(format!("cost at {} is not finite", point.timestamp));
        }
        if point.timestamp < start || point.timestamp > end {
            problems.push(format!("point at {} lies outside the range", point.timestamp));
        }
    }
    if (resp.total_count as usize) < resp.results.len() {
        problems.push(format!(
            "total_count {} is smaller than the {} points returned",
            resp.total_count,
            resp.results.len()
        ));
    }

    let mut outcome = CheckOutcome::from_problems(problems)
        .with_detail(format!("{} of {} points", resp.results.len(), resp.total_count));
    if resp.fallback_hint == FallbackHint::Unspecified {
        outcome = outcome.with_detail("fallback_hint left unspecified");
    }
    outcome
}

async fn recommendation_schema(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetRecommendations) {
        return outcome;
    }

    let request = GetRecommendationsRequest {
        page_size: 50,
        ..GetRecommendationsRequest::default()
    };
    let resp = match ctx.client.get_recommendations(&request).await {
        Ok(resp) => resp,
        Err(status) => return CheckOutcome::fail(format!("GetRecommendations failed: {status}")),
    };

    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for record in &resp.recommendations {
        if record.id.is_empty() {
            problems.push("recommendation with an empty id".to_string());
        } else if !seen.insert(record.id.as_str()) {
            problems.push(format!("duplicate recommendation id '{}'", record.id));
        }
        if let Some(score) = record.confidence_score {
            if !(0.0..=1.0).contains(&score) {
                problems.push(format!("'{}' has confidence {score} outside [0, 1]", record.id));
            }
        }
        if let Some(impact) = &record.impact {
            if !impact.currency.is_empty() && !is_valid_currency(&impact.currency) {
                problems.push(format!(
                    "'{}' has invalid currency '{}'",
                    record.id, impact.currency
                ));
            }
        }
    }

    if let Some(summary) = &resp.summary {
        let counted: u64 = summary.count_by_category.values().sum();
        if counted != summary.total_recommendations {
            problems.push(format!(
                "summary counts {counted} records by category but totals {}",
                summary.total_recommendations
            ));
        }
        let saved: f64 = summary.savings_by_category.values().sum();
        let scale = summary.total_estimated_savings.abs().max(1.0);
        if (saved - summary.total_estimated_savings).abs() > TOLERANCE * scale {
            problems.push(format!(
                "summary savings by category sum to {saved:.4}, total is {:.4}",
                summary.total_estimated_savings
            ));
        }
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{} records on the first page", resp.recommendations.len()))
}

async fn budget_schema(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetBudgets) {
        return outcome;
    }

    let request = GetBudgetsRequest {
        filter: None,
        include_status: true,
    };
    let resp = match ctx.client.get_budgets(&request).await {
        Ok(resp) => resp,
        Err(status) => return CheckOutcome::fail(format!("GetBudgets failed: {status}")),
    };

    let mut problems = Vec::new();
    for budget in &resp.budgets {
        if budget.id.is_empty() {
            problems.push("budget with an empty id".to_string());
        }
        if !budget.amount.limit.is_finite() || budget.amount.limit < 0.0 {
            problems.push(format!("'{}' has limit {}", budget.id, budget.amount.limit));
        }
        if !is_valid_currency(&budget.amount.currency) {
            problems.push(format!(
                "'{}' has invalid currency '{}'",
                budget.id, budget.amount.currency
            ));
        }
        if let Some(status) = &budget.status {
            let expected = BudgetHealth::from_percentage(status.percentage_used);
            if status.health != expected {
                problems.push(format!(
                    "'{}' is {:?} at {:.1}% used, expected {:?}",
                    budget.id, status.health, status.percentage_used, expected
                ));
            }
        }
    }

    let expected = BudgetSummary::from_budgets(&resp.budgets);
    if resp.summary.total_budgets != expected.total_budgets {
        problems.push(format!(
            "summary totals {} budgets, response holds {}",
            resp.summary.total_budgets, expected.total_budgets
        ));
    }
    let bucketed = resp.summary.budgets_ok
        + resp.summary.budgets_warning
        + resp.summary.budgets_critical
        + resp.summary.budgets_exceeded;
    if bucketed > resp.summary.total_budgets {
        problems.push(format!(
            "summary buckets hold {bucketed} budgets, more than the total {}",
            resp.summary.total_budgets
        ));
    }

    CheckOutcome::from_problems(problems).with_detail(format!("{} budgets", resp.budgets.len()))
}

async fn estimate_cost_schema(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::EstimateCost) {
        return outcome;
    }

    let request = sample_estimate_request();
    match ctx.client.estimate_cost(&request).await {
        Ok(resp) => {
            let mut problems = Vec::new();
            if !resp.cost_monthly.is_finite() || resp.cost_monthly < 0.0 {
                problems.push(format!(
                    "cost_monthly {} is negative or not finite",
                    resp.cost_monthly
                ));
            }
            if !is_valid_currency(&resp.currency) {
                problems.push(format!("currency '{}' is not an ISO 4217 code", resp.currency));
            }
            CheckOutcome::from_problems(problems)
                .with_detail(format!("{:.4} {}/month", resp.cost_monthly, resp.currency))
        }
        Err(status) if status.code == StatusCode::NotFound => CheckOutcome::pass()
            .with_detail(format!("{} not estimable by this plugin", request.resource_type)),
        Err(status) => CheckOutcome::fail(format!("EstimateCost failed: {status}")),
    }
}
