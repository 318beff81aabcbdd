// Summary Aggregation
//
// *Le Résumé* (The Summary) - Per-category and per-action counts and savings
// over a set of recommendation records.

use crate::model::Recommendation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregates over a set of recommendations.
///
/// Map keys are the canonical enum names (`COST`, `RIGHTSIZE`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSummary {
    /// Number of records summarised
    pub total_recommendations: u64,
    /// Signed sum of estimated savings
    pub total_estimated_savings: f64,
    /// Shared currency, or empty when currencies disagree or none was given
    pub currency: String,
    /// Echo of the requested projection period
    pub projection_period: String,
    /// Records per category
    pub count_by_category: BTreeMap<String, u64>,
    /// Savings per category
    pub savings_by_category: BTreeMap<String, f64>,
    /// Records per action type
    pub count_by_action_type: BTreeMap<String, u64>,
    /// Savings per action type
    pub savings_by_action_type: BTreeMap<String, f64>,
}

impl RecommendationSummary {
    /// Whether the summed savings are labelled with a single currency
    pub fn has_currency(&self) -> bool {
        !self.currency.is_empty()
    }
}

/// Summarise `records`.
///
/// Anomalies may carry negative savings and lower the total. When two or
/// more distinct non-empty currencies appear the currency is left empty
/// rather than labelling a mixed sum.
pub fn summarize(records: &[Recommendation], projection_period: &str) -> RecommendationSummary {
    let mut summary = RecommendationSummary {
        total_recommendations: records.len() as u64,
        projection_period: projection_period.to_string(),
        ..RecommendationSummary::default()
    };

    let mut currency: Option<&str> = None;
    let mut ambiguous = false;

    for record in records {
        let savings = record.estimated_savings();
        let category = record.category.as_str().to_string();
        let action = record.action_type.as_str().to_string();

        *summary.count_by_category.entry(category.clone()).or_insert(0) += 1;
        *summary.savings_by_category.entry(category).or_insert(0.0) += savings;
        *summary.count_by_action_type.entry(action.clone()).or_insert(0) += 1;
        *summary.savings_by_action_type.entry(action).or_insert(0.0) += savings;
        summary.total_estimated_savings += savings;

        if let Some(impact) = &record.impact {
            if impact.currency.is_empty() {
                continue;
            }
            match currency {
                None => currency = Some(&impact.currency),
                Some(seen) if seen != impact.currency => ambiguous = true,
                Some(_) => {}
            }
        }
    }

    if ambiguous {
        debug!(records = records.len(), "mixed currencies in summary; leaving currency empty");
    } else if let Some(code) = currency {
        summary.currency = code.to_string();
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionType, Impact, RecommendationCategory};

    fn rec(category: RecommendationCategory, action: ActionType, savings: f64, currency: &str) -> Recommendation {
        Recommendation {
            category,
            action_type: action,
            impact: Some(Impact {
                estimated_savings: savings,
                currency: currency.to_string(),
                projection_period: "monthly".to_string(),
            }),
            ..Recommendation::default()
        }
    }

    #[test]
    fn test_counts_and_savings() {
        let records = vec![
            rec(RecommendationCategory::Cost, ActionType::Rightsize, 10.0, "USD"),
            rec(RecommendationCategory::Cost, ActionType::Terminate, 30.0, "USD"),
            rec(RecommendationCategory::Performance, ActionType::Rightsize, 5.0, "USD"),
        ];
        let summary = summarize(&records, "monthly");

        assert_eq!(summary.total_recommendations, 3);
        assert_eq!(summary.total_estimated_savings, 45.0);
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.projection_period, "monthly");
        assert_eq!(summary.count_by_category["COST"], 2);
        assert_eq!(summary.savings_by_category["COST"], 40.0);
        assert_eq!(summary.count_by_action_type["RIGHTSIZE"], 2);
        assert_eq!(summary.savings_by_action_type["TERMINATE"], 30.0);
    }

    #[test]
    fn test_anomaly_lowers_total() {
        let records = vec![
            rec(RecommendationCategory::Cost, ActionType::Rightsize, 50.0, "USD"),
            rec(RecommendationCategory::Anomaly, ActionType::Investigate, -20.0, "USD"),
        ];
        let summary = summarize(&records, "monthly");
        assert_eq!(summary.total_estimated_savings, 30.0);
        assert_eq!(summary.savings_by_category["ANOMALY"], -20.0);
    }

    #[test]
    fn test_mixed_currencies_leave_currency_empty() {
        let records = vec![
            rec(RecommendationCategory::Cost, ActionType::Rightsize, 10.0, "USD"),
            rec(RecommendationCategory::Cost, ActionType::Rightsize, 10.0, "EUR"),
        ];
        let summary = summarize(&records, "monthly");
        assert!(summary.currency.is_empty());
        assert!(!summary.has_currency());
    }

    #[test]
    fn test_missing_impact_counts_without_savings() {
        let records = vec![
            Recommendation {
                category: RecommendationCategory::Security,
                action_type: ActionType::Modify,
                ..Recommendation::default()
            },
            rec(RecommendationCategory::Cost, ActionType::Rightsize, 12.5, ""),
        ];
        let summary = summarize(&records, "");
        assert_eq!(summary.count_by_category["SECURITY"], 1);
        assert_eq!(summary.savings_by_category["SECURITY"], 0.0);
        assert_eq!(summary.total_estimated_savings, 12.5);
        assert!(summary.currency.is_empty());
        assert!(summary.projection_period.is_empty());
    }

    #[test]
    fn test_empty_records() {
        let summary = summarize(&[], "annual");
        assert_eq!(summary.total_recommendations, 0);
        assert!(summary.count_by_category.is_empty());
        assert_eq!(summary.projection_period, "annual");
    }
}
