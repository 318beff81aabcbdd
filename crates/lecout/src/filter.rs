// Recommendation Filtering
//
// *La Sélection* (The Selection) - AND-combined narrowing of recommendation
// records, plus the stable ordering applied before pagination.

use crate::matcher;
use crate::model::{
    Recommendation, RecommendationFilter, ResourceDescriptor, SortBy, SortOrder,
};
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

/// Apply `filter` to `records`, evaluating age against the current time.
pub fn apply(records: &[Recommendation], filter: &RecommendationFilter) -> Vec<Recommendation> {
    apply_at(records, filter, Utc::now())
}

/// Apply `filter` to `records`, evaluating age against `now`.
///
/// Returns a new list in the input's relative order.
pub fn apply_at(
    records: &[Recommendation],
    filter: &RecommendationFilter,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    records
        .iter()
        .filter(|record| matches_filter(record, filter, now))
        .cloned()
        .collect()
}

/// Whether one record satisfies every specified criterion.
///
/// A record that lacks a thresholded field (impact, confidence, creation
/// time) fails that threshold when the threshold is set.
pub fn matches_filter(
    record: &Recommendation,
    filter: &RecommendationFilter,
    now: DateTime<Utc>,
) -> bool {
    let resource = &record.resource;

    if !filter.provider.is_empty() && resource.provider != filter.provider {
        return false;
    }
    if !filter.region.is_empty() && resource.region != filter.region {
        return false;
    }
    if !filter.resource_type.is_empty() && resource.resource_type != filter.resource_type {
        return false;
    }
    if !filter.resource_id.is_empty() && resource.id != filter.resource_id {
        return false;
    }
    if !filter.account_id.is_empty() && record.account_id != filter.account_id {
        return false;
    }
    if !filter.source.is_empty() && record.source != filter.source {
        return false;
    }

    if !filter.category.is_unspecified() && record.category != filter.category {
        return false;
    }
    if !filter.action_type.is_unspecified() && record.action_type != filter.action_type {
        return false;
    }
    if !filter.priority.is_unspecified() && record.priority != filter.priority {
        return false;
    }

    if filter.min_estimated_savings != 0.0 {
        match &record.impact {
            Some(impact) if impact.estimated_savings >= filter.min_estimated_savings => {}
            _ => return false,
        }
    }

    if filter.min_confidence_score != 0.0 {
        match record.confidence_score {
            Some(score) if score >= filter.min_confidence_score => {}
            _ => return false,
        }
    }

    if filter.max_age_days > 0 {
        let max_age = Duration::days(i64::from(filter.max_age_days));
        match record.created_at {
            Some(created) if now.signed_duration_since(created) <= max_age => {}
            _ => return false,
        }
    }

    true
}

/// Stable sort by the filter's ordering field.
///
/// `SortBy::Unspecified` leaves the order untouched. Direction defaults to
/// descending. Missing values sort as the smallest.
pub fn sort_recommendations(records: &mut [Recommendation], sort_by: SortBy, order: SortOrder) {
    if sort_by == SortBy::Unspecified {
        return;
    }

    records.sort_by(|a, b| {
        let ord = compare_by(a, b, sort_by);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc | SortOrder::Unspecified => ord.reverse(),
        }
    });
}

fn compare_by(a: &Recommendation, b: &Recommendation, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Unspecified => Ordering::Equal,
        SortBy::EstimatedSavings => a.estimated_savings().total_cmp(&b.estimated_savings()),
        SortBy::Priority => a.priority.cmp(&b.priority),
        SortBy::ConfidenceScore => a
            .confidence_score
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&b.confidence_score.unwrap_or(f64::NEG_INFINITY)),
        SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Scope, filter, then order: the candidate universe for one paginated query.
///
/// Scoping always runs before filtering so downstream aggregates describe
/// scope ∩ selection.
pub fn select(
    records: &[Recommendation],
    targets: &[ResourceDescriptor],
    filter: Option<&RecommendationFilter>,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let scoped = matcher::scope(records, targets);
    let Some(filter) = filter else {
        return scoped;
    };

    let mut selected = apply_at(&scoped, filter, now);
    sort_recommendations(&mut selected, filter.sort_by, filter.sort_order);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActionType, Impact, Priority, RecommendationCategory, ResourceRecommendationInfo,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn record(id: &str, category: RecommendationCategory, provider: &str, resource_type: &str) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            category,
            action_type: ActionType::Rightsize,
            priority: Priority::Medium,
            resource: ResourceRecommendationInfo {
                id: format!("res-{id}"),
                provider: provider.to_string(),
                resource_type: resource_type.to_string(),
                region: "us-east-1".to_string(),
                ..ResourceRecommendationInfo::default()
            },
            impact: Some(Impact {
                estimated_savings: 25.0,
                currency: "USD".to_string(),
                projection_period: "monthly".to_string(),
            }),
            confidence_score: Some(0.8),
            created_at: Some(now() - Duration::days(3)),
            ..Recommendation::default()
        }
    }

    #[test]
    fn test_empty_filter_keeps_all() {
        let records = vec![
            record("a", RecommendationCategory::Cost, "aws", "ec2"),
            record("b", RecommendationCategory::Security, "gcp", "gcs"),
        ];
        assert_eq!(apply_at(&records, &RecommendationFilter::default(), now()).len(), 2);
    }

    #[test]
    fn test_scope_and_filter_are_anded() {
        let records = vec![
            record("cost-aws-ec2", RecommendationCategory::Cost, "aws", "ec2"),
            record("perf-aws-ec2", RecommendationCategory::Performance, "aws", "ec2"),
            record("cost-azure-vm", RecommendationCategory::Cost, "azure", "vm"),
        ];
        let filter = RecommendationFilter {
            category: RecommendationCategory::Cost,
            ..RecommendationFilter::default()
        };
        let selected = select(
            &records,
            &[ResourceDescriptor::new("aws", "ec2")],
            Some(&filter),
            now(),
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "cost-aws-ec2");
    }

    #[test]
    fn test_thresholds() {
        let mut low = record("low", RecommendationCategory::Cost, "aws", "ec2");
        low.impact.as_mut().unwrap().estimated_savings = 5.0;
        low.confidence_score = Some(0.3);
        let mut bare = record("bare", RecommendationCategory::Cost, "aws", "ec2");
        bare.impact = None;
        bare.confidence_score = None;
        let high = record("high", RecommendationCategory::Cost, "aws", "ec2");
        let records = vec![low, bare, high];

        let by_savings = RecommendationFilter {
            min_estimated_savings: 10.0,
            ..RecommendationFilter::default()
        };
        let ids: Vec<_> = apply_at(&records, &by_savings, now())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["high"]);

        let by_confidence = RecommendationFilter {
            min_confidence_score: 0.5,
            ..RecommendationFilter::default()
        };
        assert_eq!(apply_at(&records, &by_confidence, now()).len(), 1);
    }

    #[test]
    fn test_max_age() {
        let mut old = record("old", RecommendationCategory::Cost, "aws", "ec2");
        old.created_at = Some(now() - Duration::days(40));
        let fresh = record("fresh", RecommendationCategory::Cost, "aws", "ec2");
        let filter = RecommendationFilter {
            max_age_days: 30,
            ..RecommendationFilter::default()
        };
        let kept = apply_at(&[old, fresh], &filter, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "fresh");
    }

    #[test]
    fn test_string_fields_and_order_preserved() {
        let records = vec![
            record("1", RecommendationCategory::Cost, "aws", "ec2"),
            record("2", RecommendationCategory::Cost, "gcp", "compute_engine"),
            record("3", RecommendationCategory::Cost, "aws", "ec2"),
        ];
        let filter = RecommendationFilter {
            provider: "aws".to_string(),
            region: "us-east-1".to_string(),
            ..RecommendationFilter::default()
        };
        let ids: Vec<_> = apply_at(&records, &filter, now())
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_sort_by_savings_descending_is_stable() {
        let mut records = vec![
            record("a", RecommendationCategory::Cost, "aws", "ec2"),
            record("b", RecommendationCategory::Cost, "aws", "ec2"),
            record("c", RecommendationCategory::Cost, "aws", "ec2"),
        ];
        records[1].impact.as_mut().unwrap().estimated_savings = 99.0;
        sort_recommendations(&mut records, SortBy::EstimatedSavings, SortOrder::Unspecified);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        sort_recommendations(&mut records, SortBy::EstimatedSavings, SortOrder::Asc);
        assert_eq!(records.last().map(|r| r.id.as_str()), Some("b"));
    }
}
