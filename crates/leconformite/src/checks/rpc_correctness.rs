// RPC Correctness Checks
//
// Request validation, pagination and scoping behaviour, and the status codes
// a plugin answers with when a request is malformed or a method is missing.

use super::{expect_invalid_argument, invoke, recent_range, sample_resource, unless_implemented, SAMPLE_RESOURCE_ID};
use crate::level::{ConformanceLevel, TestCategory};
use crate::suite::{CheckContext, CheckOutcome, ConformanceSuiteTest};
use chrono::{DateTime, Utc};
use lecout::messages::{
    EstimateCostRequest, GetActualCostRequest, GetPricingSpecRequest, GetProjectedCostRequest,
    GetRecommendationsRequest, SupportsRequest,
};
use lecout::validate::MAX_TARGET_RESOURCES;
use lecout::{matches, RecommendationCategory, RecommendationFilter, ResourceDescriptor, RpcMethod};
use lepasserelle::StatusCode;
use std::collections::{BTreeSet, HashSet};

/// Upper bound on pages followed before a token chain counts as endless
const MAX_PAGES: usize = 1_000;

pub(super) fn tests() -> Vec<ConformanceSuiteTest> {
    use ConformanceLevel::{Basic, Standard};
    use TestCategory::RpcCorrectness;

    vec![
        ConformanceSuiteTest::new(
            "supports_requires_resource",
            "Supports rejects a request without a resource",
            RpcCorrectness,
            Basic,
            supports_requires_resource,
        ),
        ConformanceSuiteTest::new(
            "projected_cost_requires_resource",
            "GetProjectedCost rejects missing or incomplete resources",
            RpcCorrectness,
            Basic,
            projected_cost_requires_resource,
        ),
        ConformanceSuiteTest::new(
            "pricing_spec_requires_resource",
            "GetPricingSpec rejects a request without a resource",
            RpcCorrectness,
            Basic,
            pricing_spec_requires_resource,
        ),
        ConformanceSuiteTest::new(
            "actual_cost_rejects_reversed_range",
            "GetActualCost rejects an end before the start and a missing resource id",
            RpcCorrectness,
            Basic,
            actual_cost_rejects_reversed_range,
        ),
        ConformanceSuiteTest::new(
            "unimplemented_is_clean",
            "Optional methods a plugin lacks answer UNIMPLEMENTED",
            RpcCorrectness,
            Basic,
            unimplemented_is_clean,
        ),
        ConformanceSuiteTest::new(
            "actual_cost_pagination",
            "GetActualCost pages cover the range exactly once",
            RpcCorrectness,
            Standard,
            actual_cost_pagination,
        ),
        ConformanceSuiteTest::new(
            "recommendations_pagination",
            "GetRecommendations pages are bounded, disjoint and reject a garbage token",
            RpcCorrectness,
            Standard,
            recommendations_pagination,
        ),
        ConformanceSuiteTest::new(
            "recommendations_target_scope",
            "GetRecommendations honours target resources, including duplicates",
            RpcCorrectness,
            Standard,
            recommendations_target_scope,
        ),
        ConformanceSuiteTest::new(
            "recommendations_filter",
            "GetRecommendations honours the category filter",
            RpcCorrectness,
            Standard,
            recommendations_filter,
        ),
        ConformanceSuiteTest::new(
            "recommendations_target_limit",
            "GetRecommendations rejects more than the maximum number of targets",
            RpcCorrectness,
            Standard,
            recommendations_target_limit,
        ),
        ConformanceSuiteTest::new(
            "estimate_cost_token_validation",
            "EstimateCost rejects a malformed resource type token",
            RpcCorrectness,
            Standard,
            estimate_cost_token_validation,
        ),
    ]
}

async fn supports_requires_resource(ctx: CheckContext) -> CheckOutcome {
    let result = ctx.client.supports(&SupportsRequest { resource: None }).await;
    expect_invalid_argument(result, "Supports without resource")
}

async fn projected_cost_requires_resource(ctx: CheckContext) -> CheckOutcome {
    let missing = ctx
        .client
        .get_projected_cost(&GetProjectedCostRequest { resource: None })
        .await;
    let missing = expect_invalid_argument(missing, "GetProjectedCost without resource");
    if !missing.success {
        return missing;
    }

    let incomplete = ctx
        .client
        .get_projected_cost(&GetProjectedCostRequest {
            resource: Some(ResourceDescriptor::new("", "ec2")),
        })
        .await;
    let incomplete = expect_invalid_argument(incomplete, "GetProjectedCost without provider");

    let mut outcome = incomplete;
    outcome.details.splice(0..0, missing.details);
    outcome
}

async fn pricing_spec_requires_resource(ctx: CheckContext) -> CheckOutcome {
    let result = ctx
        .client
        .get_pricing_spec(&GetPricingSpecRequest { resource: None })
        .await;
    expect_invalid_argument(result, "GetPricingSpec without resource")
}

async fn actual_cost_rejects_reversed_range(ctx: CheckContext) -> CheckOutcome {
    let (start, end) = recent_range(7);
    let reversed = ctx
        .client
        .get_actual_cost(&GetActualCostRequest {
            resource_id: SAMPLE_RESOURCE_ID.to_string(),
            start: Some(end),
            end: Some(start),
            ..GetActualCostRequest::default()
        })
        .await;
    let reversed = expect_invalid_argument(reversed, "GetActualCost with end before start");
    if !reversed.success {
        return reversed;
    }

    let anonymous = ctx
        .client
        .get_actual_cost(&GetActualCostRequest {
            start: Some(start),
            end: Some(end),
            ..GetActualCostRequest::default()
        })
        .await;
    let mut outcome = expect_invalid_argument(anonymous, "GetActualCost without resource id");
    outcome.details.splice(0..0, reversed.details);
    outcome
}

async fn unimplemented_is_clean(ctx: CheckContext) -> CheckOutcome {
    let missing = ctx.capabilities.missing_optional();
    if missing.is_empty() {
        return CheckOutcome::pass().with_detail("every optional method is implemented");
    }

    let mut problems = Vec::new();
    for method in &missing {
        match invoke(&ctx.client, *method).await {
            Err(status) if status.code == StatusCode::Unimplemented => {}
            Err(status) => problems.push(format!("{method} answered {} instead of UNIMPLEMENTED", status.code)),
            Ok(()) => problems.push(format!("{method} succeeded but was probed as unimplemented")),
        }
    }

    let names: Vec<_> = missing.iter().map(|m| m.as_str()).collect();
    CheckOutcome::from_problems(problems).with_detail(format!("unimplemented: {}", names.join(", ")))
}

async fn actual_cost_pagination(ctx: CheckContext) -> CheckOutcome {
    const PAGE_SIZE: i32 = 7;
    let (start, end) = recent_range(30);

    let mut timestamps: BTreeSet<DateTime<Utc>> = BTreeSet::new();
    let mut problems = Vec::new();
    let mut total = None;
    let mut token = String::new();
    let mut pages = 0;

    loop {
        let request = GetActualCostRequest {
            resource_id: SAMPLE_RESOURCE_ID.to_string(),
            start: Some(start),
            end: Some(end),
            page_size: PAGE_SIZE,
            page_token: token.clone(),
            ..GetActualCostRequest::default()
        };
        let resp = match ctx.client.get_actual_cost(&request).await {
            Ok(resp) => resp,
            Err(status) if pages == 0 && status.code == StatusCode::NotFound => {
                return CheckOutcome::pass().with_detail("no cost data for the sample resource")
            }
            Err(status) => {
                return CheckOutcome::fail(format!("GetActualCost page {} failed: {status}", pages + 1))
            }
        };
        pages += 1;

        if resp.results.len() > PAGE_SIZE as usize {
            problems.push(format!(
                "page {pages} holds {} points, page size is {PAGE_SIZE}",
                resp.results.len()
            ));
        }
        for point in &resp.results {
            if !timestamps.insert(point.timestamp) {
                problems.push(format!("point at {} returned twice", point.timestamp));
            }
        }
        let reported = *total.get_or_insert(resp.total_count);
        if reported != resp.total_count {
            problems.push(format!(
                "total_count changed from {reported} to {} across pages",
                resp.total_count
            ));
        }

        if resp.next_page_token.is_empty() {
            break;
        }
        if pages >= MAX_PAGES {
            problems.push(format!("token chain did not end after {MAX_PAGES} pages"));
            break;
        }
        token = resp.next_page_token;
    }

    let total = total.unwrap_or_default();
    if timestamps.len() as u64 != total {
        problems.push(format!(
            "pages returned {} points, total_count is {total}",
            timestamps.len()
        ));
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{} points over {pages} pages", timestamps.len()))
}

async fn recommendations_pagination(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetRecommendations) {
        return outcome;
    }
    const PAGE_SIZE: i32 = 7;

    let mut ids = HashSet::new();
    let mut problems = Vec::new();
    let mut token = String::new();
    let mut pages = 0;

    loop {
        let request = GetRecommendationsRequest {
            page_size: PAGE_SIZE,
            page_token: token.clone(),
            ..GetRecommendationsRequest::default()
        };
        let resp = match ctx.client.get_recommendations(&request).await {
            Ok(resp) => resp,
            Err(status) => {
                return CheckOutcome::fail(format!(
                    "GetRecommendations page {} failed: {status}",
                    pages + 1
                ))
            }
        };
        pages += 1;

        if resp.recommendations.len() > PAGE_SIZE as usize {
            problems.push(format!(
                "page {pages} holds {} records, page size is {PAGE_SIZE}",
                resp.recommendations.len()
            ));
        }
        for record in resp.recommendations {
            if !ids.insert(record.id.clone()) {
                problems.push(format!("'{}' returned on more than one page", record.id));
            }
        }

        if resp.next_page_token.is_empty() {
            break;
        }
        if pages >= MAX_PAGES {
            problems.push(format!("token chain did not end after {MAX_PAGES} pages"));
            break;
        }
        token = resp.next_page_token;
    }

    let garbage = ctx
        .client
        .get_recommendations(&GetRecommendationsRequest {
            page_size: PAGE_SIZE,
            page_token: "not-a-page-token!".to_string(),
            ..GetRecommendationsRequest::default()
        })
        .await;
    let garbage = expect_invalid_argument(garbage, "GetRecommendations with a garbage token");
    if let Some(error) = garbage.error {
        problems.push(error);
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{} records over {pages} pages", ids.len()))
}

async fn recommendations_target_scope(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetRecommendations) {
        return outcome;
    }

    let target = ResourceDescriptor::new("aws", "ec2");
    let scoped = |targets: Vec<ResourceDescriptor>| GetRecommendationsRequest {
        target_resources: targets,
        page_size: 1_000,
        ..GetRecommendationsRequest::default()
    };

    let single = match ctx.client.get_recommendations(&scoped(vec![target.clone()])).await {
        Ok(resp) => resp,
        Err(status) => return CheckOutcome::fail(format!("scoped GetRecommendations failed: {status}")),
    };
    let mut problems = Vec::new();
    for record in &single.recommendations {
        if !matches(&record.resource, &target) {
            problems.push(format!(
                "'{}' ({}/{}) lies outside the target scope",
                record.id, record.resource.provider, record.resource.resource_type
            ));
        }
    }

    let tripled = match ctx
        .client
        .get_recommendations(&scoped(vec![target.clone(), target.clone(), target]))
        .await
    {
        Ok(resp) => resp,
        Err(status) => {
            return CheckOutcome::fail(format!(
                "GetRecommendations with duplicate targets failed: {status}"
            ))
        }
    };
    let single_ids: BTreeSet<_> = single.recommendations.iter().map(|r| &r.id).collect();
    let tripled_ids: Vec<_> = tripled.recommendations.iter().map(|r| &r.id).collect();
    if tripled_ids.len() != single_ids.len() || !tripled_ids.iter().all(|id| single_ids.contains(id)) {
        problems.push(format!(
            "duplicate targets returned {} records, a single target {}",
            tripled_ids.len(),
            single_ids.len()
        ));
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{} records in aws/ec2 scope", single_ids.len()))
}

async fn recommendations_filter(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetRecommendations) {
        return outcome;
    }

    let request = GetRecommendationsRequest {
        filter: Some(RecommendationFilter {
            category: RecommendationCategory::Cost,
            ..RecommendationFilter::default()
        }),
        page_size: 1_000,
        ..GetRecommendationsRequest::default()
    };
    let resp = match ctx.client.get_recommendations(&request).await {
        Ok(resp) => resp,
        Err(status) => return CheckOutcome::fail(format!("filtered GetRecommendations failed: {status}")),
    };

    let problems = resp
        .recommendations
        .iter()
        .filter(|r| r.category != RecommendationCategory::Cost)
        .map(|r| format!("'{}' has category {} under a COST filter", r.id, r.category.as_str()))
        .collect();

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{} COST records", resp.recommendations.len()))
}

async fn recommendations_target_limit(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::GetRecommendations) {
        return outcome;
    }

    let request = GetRecommendationsRequest {
        target_resources: vec![sample_resource(); MAX_TARGET_RESOURCES + 1],
        ..GetRecommendationsRequest::default()
    };
    let result = ctx.client.get_recommendations(&request).await;
    expect_invalid_argument(
        result,
        &format!("GetRecommendations with {} targets", MAX_TARGET_RESOURCES + 1),
    )
}

async fn estimate_cost_token_validation(ctx: CheckContext) -> CheckOutcome {
    if let Some(outcome) = unless_implemented(&ctx, RpcMethod::EstimateCost) {
        return outcome;
    }

    let mut problems = Vec::new();
    let mut details = Vec::new();
    for token in ["", "ec2", "aws:ec2", "AWS:ec2/instance:Instance"] {
        let request = EstimateCostRequest {
            resource_type: token.to_string(),
            ..EstimateCostRequest::default()
        };
        let outcome = expect_invalid_argument(
            ctx.client.estimate_cost(&request).await,
            &format!("EstimateCost with token '{token}'"),
        );
        match outcome.error {
            Some(error) => problems.push(error),
            None => details.extend(outcome.details),
        }
    }

    let mut outcome = CheckOutcome::from_problems(problems);
    if outcome.success {
        outcome.details = details;
    }
    outcome
}
