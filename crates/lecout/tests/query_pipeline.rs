// Integration Tests for the lecout query pipeline
//
// Scope -> filter -> order -> paginate -> summarize, exercised the way a
// plugin's GetRecommendations handler chains them.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lecout::filter::select;
use lecout::model::{
    ActionType, Impact, Priority, Recommendation, RecommendationCategory, RecommendationFilter,
    ResourceDescriptor, ResourceRecommendationInfo, SortBy, SortOrder,
};
use lecout::{paginate, summarize, CoutError};
use std::collections::HashSet;

fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn dataset(len: usize) -> Vec<Recommendation> {
    let providers = [("aws", "ec2"), ("azure", "vm"), ("gcp", "compute_engine")];
    (0..len)
        .map(|i| {
            let (provider, resource_type) = providers[i % providers.len()];
            Recommendation {
                id: format!("rec-{i:04}"),
                category: if i % 4 == 0 {
                    RecommendationCategory::Performance
                } else {
                    RecommendationCategory::Cost
                },
                action_type: ActionType::Rightsize,
                priority: Priority::Medium,
                resource: ResourceRecommendationInfo {
                    id: format!("res-{i}"),
                    provider: provider.to_string(),
                    resource_type: resource_type.to_string(),
                    region: "us-east-1".to_string(),
                    ..ResourceRecommendationInfo::default()
                },
                impact: Some(Impact {
                    estimated_savings: (i % 10) as f64 * 5.0,
                    currency: "USD".to_string(),
                    projection_period: "monthly".to_string(),
                }),
                confidence_score: Some(0.5 + (i % 5) as f64 * 0.1),
                created_at: Some(reference_time() - Duration::days(i as i64)),
                ..Recommendation::default()
            }
        })
        .collect()
}

mod pagination_workflow {
    use super::*;

    #[test]
    fn test_120_records_in_three_pages() {
        let records = dataset(120);
        let selected = select(&records, &[], None, reference_time());

        let mut pages = Vec::new();
        let mut token = String::new();
        loop {
            let page = paginate(&selected, 50, &token).expect("valid token");
            let next = page.next_page_token.clone();
            pages.push(page);
            if next.is_empty() {
                break;
            }
            token = next;
        }

        let sizes: Vec<_> = pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, vec![50, 50, 20]);

        let ids: HashSet<_> = pages
            .iter()
            .flat_map(|p| p.items.iter().map(|r| r.id.clone()))
            .collect();
        assert_eq!(ids.len(), 120, "no duplicates and no gaps");
    }

    #[test]
    fn test_sorted_selection_pages_are_stable_across_calls() {
        let records = dataset(75);
        let filter = RecommendationFilter {
            sort_by: SortBy::EstimatedSavings,
            sort_order: SortOrder::Desc,
            ..RecommendationFilter::default()
        };

        let first = select(&records, &[], Some(&filter), reference_time());
        let second = select(&records, &[], Some(&filter), reference_time());
        assert_eq!(first, second);

        let p1 = paginate(&first, 30, "").unwrap();
        let p2 = paginate(&second, 30, &p1.next_page_token).unwrap();
        let overlap = p1
            .items
            .iter()
            .filter(|r| p2.items.iter().any(|o| o.id == r.id))
            .count();
        assert_eq!(overlap, 0);
    }

    #[test]
    fn test_garbage_token_is_client_error() {
        let records = dataset(3);
        let err = paginate(&records, 10, "%%%").unwrap_err();
        assert!(matches!(err, CoutError::InvalidToken { .. }));
    }
}

mod scope_and_summary {
    use super::*;

    #[test]
    fn test_summary_reflects_scope_and_filter() {
        let records = dataset(30);
        let filter = RecommendationFilter {
            category: RecommendationCategory::Cost,
            ..RecommendationFilter::default()
        };
        let selected = select(
            &records,
            &[ResourceDescriptor::new("aws", "ec2")],
            Some(&filter),
            reference_time(),
        );

        assert!(selected
            .iter()
            .all(|r| r.resource.provider == "aws" && r.category == RecommendationCategory::Cost));

        let summary = summarize(&selected, "monthly");
        assert_eq!(summary.total_recommendations as usize, selected.len());
        assert_eq!(summary.count_by_category.len(), 1);
        assert_eq!(summary.currency, "USD");
    }

    #[test]
    fn test_max_age_relative_to_reference_time() {
        let records = dataset(60);
        let filter = RecommendationFilter {
            max_age_days: 7,
            ..RecommendationFilter::default()
        };
        let selected = select(&records, &[], Some(&filter), reference_time());
        assert_eq!(selected.len(), 8);
    }
}
