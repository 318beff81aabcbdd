// Integration Tests for LeSimulacre
//
// The mock plugin driven through the real harness and client, so every
// request and response crosses the JSON envelope boundary.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use lecout::messages::{
    GetActualCostRequest, GetBudgetsRequest, GetRecommendationsRequest, SupportsRequest,
};
use lecout::{
    BudgetFilter, FallbackHint, RecommendationCategory, RecommendationFilter, ResourceDescriptor,
    RpcMethod,
};
use lepasserelle::{StatusCode, TestHarness};
use lesimulacre::{MockConfig, MockPlugin};
use std::time::Duration;

async fn serving(config: MockConfig) -> TestHarness {
    let harness = TestHarness::new(MockPlugin::with_config(config));
    harness.start().await.unwrap();
    harness
}

mod recommendation_tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_through_120_records() {
        let harness = serving(MockConfig::new().with_recommendation_count(120)).await;
        let client = harness.client().unwrap();

        let mut token = String::new();
        let mut sizes = Vec::new();
        let mut ids = Vec::new();
        loop {
            let resp = client
                .get_recommendations(&GetRecommendationsRequest {
                    page_size: 50,
                    page_token: token.clone(),
                    ..GetRecommendationsRequest::default()
                })
                .await
                .unwrap();
            sizes.push(resp.recommendations.len());
            ids.extend(resp.recommendations.into_iter().map(|r| r.id));
            if resp.next_page_token.is_empty() {
                break;
            }
            token = resp.next_page_token;
        }

        assert_eq!(sizes, vec![50, 50, 20]);
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 120);
    }

    #[tokio::test]
    async fn test_scope_and_filter_reach_the_plugin() {
        let harness = serving(MockConfig::new()).await;
        let resp = harness
            .client()
            .unwrap()
            .get_recommendations(&GetRecommendationsRequest {
                target_resources: vec![ResourceDescriptor::new("aws", "ec2")],
                filter: Some(RecommendationFilter {
                    category: RecommendationCategory::Cost,
                    ..RecommendationFilter::default()
                }),
                page_size: 100,
                projection_period: "monthly".to_string(),
                ..GetRecommendationsRequest::default()
            })
            .await
            .unwrap();

        assert!(!resp.recommendations.is_empty());
        for rec in &resp.recommendations {
            assert_eq!(rec.resource.provider, "aws");
            assert_eq!(rec.resource.resource_type, "ec2");
            assert_eq!(rec.category, RecommendationCategory::Cost);
        }
        let summary = resp.summary.unwrap();
        assert_eq!(summary.total_recommendations as usize, resp.recommendations.len());
        assert_eq!(summary.projection_period, "monthly");
    }

    #[tokio::test]
    async fn test_too_many_targets_is_client_error() {
        let harness = serving(MockConfig::new()).await;
        let err = harness
            .client()
            .unwrap()
            .get_recommendations(&GetRecommendationsRequest {
                target_resources: vec![ResourceDescriptor::new("aws", "ec2"); 101],
                ..GetRecommendationsRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::InvalidArgument);
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_garbage_token_is_client_error() {
        let harness = serving(MockConfig::new()).await;
        let err = harness
            .client()
            .unwrap()
            .get_recommendations(&GetRecommendationsRequest {
                page_token: "not-a-token!".to_string(),
                ..GetRecommendationsRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::InvalidArgument);
    }
}

mod cost_tests {
    use super::*;

    #[tokio::test]
    async fn test_actual_cost_pagination_and_fallback_hint() {
        let harness = serving(MockConfig::new()).await;
        let client = harness.client().unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap();

        let resp = client
            .get_actual_cost(&GetActualCostRequest {
                resource_id: "i-0abc".to_string(),
                start: Some(end - ChronoDuration::days(30)),
                end: Some(end),
                page_size: 20,
                ..GetActualCostRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(resp.results.len(), 20);
        assert_eq!(resp.total_count, 30);
        assert!(!resp.next_page_token.is_empty());
        assert_eq!(resp.fallback_hint, FallbackHint::None);

        let empty = client
            .get_actual_cost(&GetActualCostRequest {
                resource_id: "i-0abc".to_string(),
                start: Some(end),
                end: Some(end),
                ..GetActualCostRequest::default()
            })
            .await
            .unwrap();
        assert!(empty.results.is_empty());
        assert_eq!(empty.fallback_hint, FallbackHint::Recommended);
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let harness = serving(MockConfig::new()).await;
        let end = Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap();
        let err = harness
            .client()
            .unwrap()
            .get_actual_cost(&GetActualCostRequest {
                resource_id: "i-0abc".to_string(),
                start: Some(end),
                end: Some(end - ChronoDuration::days(1)),
                ..GetActualCostRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_supports_explains_refusal() {
        let harness = serving(MockConfig::new()).await;
        let resp = harness
            .client()
            .unwrap()
            .supports(&SupportsRequest {
                resource: Some(ResourceDescriptor::new("aws", "dynamodb")),
            })
            .await
            .unwrap();
        assert!(!resp.supported);
        assert!(!resp.reason.is_empty());
    }
}

mod budget_tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_filter_and_summary() {
        let harness = serving(MockConfig::new()).await;
        let resp = harness
            .client()
            .unwrap()
            .get_budgets(&GetBudgetsRequest {
                filter: Some(BudgetFilter {
                    providers: vec!["aws".to_string()],
                    ..BudgetFilter::default()
                }),
                include_status: true,
            })
            .await
            .unwrap();
        assert!(resp.budgets.iter().all(|b| b.provider == "aws"));
        assert_eq!(resp.summary.total_budgets as usize, resp.budgets.len());
        let bucketed = resp.summary.budgets_ok
            + resp.summary.budgets_warning
            + resp.summary.budgets_critical
            + resp.summary.budgets_exceeded;
        assert_eq!(bucketed, resp.summary.total_budgets);
    }
}

mod injection_tests {
    use super::*;

    #[tokio::test]
    async fn test_unimplemented_methods_are_probed_away() {
        let harness = serving(
            MockConfig::new()
                .without(RpcMethod::GetBudgets)
                .without(RpcMethod::EstimateCost),
        )
        .await;
        let caps = harness.capabilities();
        assert!(caps.supports(RpcMethod::GetRecommendations));
        assert!(!caps.supports(RpcMethod::GetBudgets));
        assert!(!caps.supports(RpcMethod::EstimateCost));
    }

    #[tokio::test]
    async fn test_injected_error_surfaces_through_client() {
        let harness = serving(MockConfig::new().with_error(RpcMethod::Supports)).await;
        let err = harness
            .client()
            .unwrap()
            .supports(&SupportsRequest {
                resource: Some(ResourceDescriptor::new("aws", "ec2")),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::Unavailable);
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_delay_is_observed() {
        let harness = serving(
            MockConfig::new().with_delay(RpcMethod::Name, Duration::from_millis(30)),
        )
        .await;
        let started = std::time::Instant::now();
        harness.client().unwrap().name().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
