// Data Synthesis
//
// Deterministic pseudo-patterns, never random: the same input always yields
// the same records, in the same order.

use crate::rates;
use chrono::{DateTime, Duration, Utc};
use lecout::model::{
    BudgetAmount, BudgetPeriod, BudgetStatus, ResourceRecommendationInfo,
};
use lecout::{
    ActionType, Budget, BudgetHealth, CostPoint, Impact, Priority, Recommendation,
    RecommendationCategory,
};
use std::collections::BTreeMap;

/// Longest actual-cost query, in days.
///
/// `GetActualCost` rejects longer ranges with `INVALID_ARGUMENT` rather than
/// returning a partial series.
pub const MAX_COST_POINTS: usize = 3_660;

const SECONDS_PER_DAY: i64 = 86_400;

/// Amplitude of the weekly cost cycle, as a fraction of the base
const WEEKLY_VARIATION: f64 = 0.10;

/// Stable 64-bit FNV-1a; `std`'s hasher is randomly keyed per process.
fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Base daily cost for a resource id, between 1.00 and 10.00
fn daily_base(resource_id: &str) -> f64 {
    1.0 + (fnv1a(resource_id) % 901) as f64 / 100.0
}

/// Number of daily points `cost_points` yields for `[start, end)`
pub fn day_count(start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
    let seconds = (end - start).num_seconds().max(0);
    let days = seconds / SECONDS_PER_DAY + i64::from(seconds % SECONDS_PER_DAY != 0);
    usize::try_from(days).unwrap_or(usize::MAX)
}

/// Daily cost points covering `[start, end)`.
///
/// Costs cycle over a seven-day week within `WEEKLY_VARIATION` of the base.
/// The cycle is keyed to the calendar day, so overlapping ranges agree on the
/// days they share.
pub fn cost_points(resource_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<CostPoint> {
    let base = daily_base(resource_id);
    let mut points = Vec::new();
    let mut day = start;

    while day < end {
        let weekday = day.timestamp().div_euclid(SECONDS_PER_DAY).rem_euclid(7);
        let variation = WEEKLY_VARIATION * ((weekday as f64) - 3.0) / 3.0;
        let cost = round_cents(base * (1.0 + variation));
        points.push(CostPoint {
            timestamp: day,
            cost,
            usage_amount: 24.0,
            usage_unit: "hour".to_string(),
            source: "mock-billing".to_string(),
        });
        // The last representable day has no successor.
        match day.checked_add_signed(Duration::days(1)) {
            Some(next) => day = next,
            None => break,
        }
    }

    points
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Resources recommendations are generated for, cycled in order
const FLEET: [(&str, &str, &str, &str); 6] = [
    ("aws", "ec2", "t3.large", "us-east-1"),
    ("aws", "rds", "db.m5.large", "us-east-1"),
    ("azure", "vm", "Standard_D2s_v3", "eastus"),
    ("aws", "ec2", "t3.medium", "us-west-2"),
    ("gcp", "compute_engine", "n1-standard-2", "us-central1"),
    ("aws", "s3", "standard", "eu-west-1"),
];

const CATEGORIES: [RecommendationCategory; 6] = [
    RecommendationCategory::Cost,
    RecommendationCategory::Cost,
    RecommendationCategory::Performance,
    RecommendationCategory::Security,
    RecommendationCategory::Reliability,
    RecommendationCategory::Anomaly,
];

fn action_for(category: RecommendationCategory, index: usize) -> ActionType {
    match category {
        RecommendationCategory::Cost => {
            [ActionType::Rightsize, ActionType::Terminate, ActionType::PurchaseCommitment]
                [index % 3]
        }
        RecommendationCategory::Performance => ActionType::Rightsize,
        RecommendationCategory::Security => ActionType::Modify,
        RecommendationCategory::Reliability => ActionType::Migrate,
        RecommendationCategory::Anomaly => ActionType::Investigate,
        RecommendationCategory::Unspecified => ActionType::Other,
    }
}

fn source_for(provider: &str) -> &'static str {
    match provider {
        "aws" => "aws-compute-optimizer",
        "azure" => "azure-advisor",
        "gcp" => "gcp-recommender",
        _ => "mock",
    }
}

/// `count` recommendations, ordered by id.
///
/// Anomalies carry negative savings; every fifth record has no confidence
/// score; ages cycle through the 30 days before `now`.
pub fn recommendations(count: usize, now: DateTime<Utc>) -> Vec<Recommendation> {
    (0..count)
        .map(|i| {
            let (provider, resource_type, sku, region) = FLEET[i % FLEET.len()];
            let category = CATEGORIES[(i / FLEET.len() + i) % CATEGORIES.len()];
            let action_type = action_for(category, i);
            let priority = [Priority::High, Priority::Medium, Priority::Low][i % 3];

            let monthly = rates::lookup(provider, resource_type)
                .map_or(50.0, |rate| rate.monthly_cost(sku));
            let fraction = 0.10 + (i % 4) as f64 * 0.10;
            let mut savings = round_cents(monthly * fraction);
            if category == RecommendationCategory::Anomaly {
                savings = -savings;
            }

            let confidence_score = if i % 5 == 4 {
                None
            } else {
                Some(0.5 + (i % 5) as f64 * 0.1)
            };

            let resource_id = format!("{provider}-{resource_type}-{:03}", i % 20);
            let mut tags = BTreeMap::new();
            tags.insert(
                "env".to_string(),
                if i % 2 == 0 { "prod" } else { "dev" }.to_string(),
            );
            tags.insert("team".to_string(), ["platform", "data", "web"][i % 3].to_string());

            Recommendation {
                id: format!("rec-{:04}", i + 1),
                category,
                action_type,
                priority,
                resource: ResourceRecommendationInfo {
                    id: resource_id.clone(),
                    name: resource_id,
                    provider: provider.to_string(),
                    resource_type: resource_type.to_string(),
                    region: region.to_string(),
                    sku: sku.to_string(),
                    tags,
                },
                impact: Some(Impact {
                    estimated_savings: savings,
                    currency: rates::CURRENCY.to_string(),
                    projection_period: "monthly".to_string(),
                }),
                confidence_score,
                description: format!(
                    "{} {} {resource_type} in {region}",
                    category.as_str().to_ascii_lowercase(),
                    action_type.as_str().to_ascii_lowercase()
                ),
                source: source_for(provider).to_string(),
                account_id: "123456789012".to_string(),
                created_at: Some(now - Duration::days((i % 30) as i64)),
            }
        })
        .collect()
}

/// Fixed budget table spanning every health bucket.
///
/// Status is attached only when `include_status` is set.
pub fn budgets(include_status: bool) -> Vec<Budget> {
    let rows: [(&str, &str, &str, &str, f64, f64, &[&str], &[&str]); 5] = [
        ("budget-001", "Platform compute", "aws", "aws-budgets", 10_000.0, 4_200.0, &["us-east-1", "us-west-2"], &["ec2"]),
        ("budget-002", "Data warehouse", "aws", "aws-budgets", 5_000.0, 4_150.0, &["us-east-1"], &["rds"]),
        ("budget-003", "Azure workloads", "azure", "azure-cost-management", 3_000.0, 2_820.0, &["eastus"], &["vm"]),
        ("budget-004", "GCP analytics", "gcp", "gcp-billing", 2_000.0, 2_400.0, &["us-central1"], &["compute_engine"]),
        ("budget-005", "Org-wide", "aws", "aws-budgets", 50_000.0, 12_500.0, &[], &[]),
    ];

    rows.iter()
        .map(|&(id, name, provider, source, limit, spend, regions, resource_types)| {
            let status = include_status.then(|| {
                let forecast = round_cents(spend * 1.15);
                let percentage_used = spend / limit * 100.0;
                BudgetStatus {
                    current_spend: spend,
                    forecasted_spend: forecast,
                    percentage_used,
                    percentage_forecasted: forecast / limit * 100.0,
                    health: BudgetHealth::from_percentage(percentage_used),
                }
            });
            Budget {
                id: id.to_string(),
                name: name.to_string(),
                provider: provider.to_string(),
                source: source.to_string(),
                amount: BudgetAmount {
                    limit,
                    currency: rates::CURRENCY.to_string(),
                },
                period: BudgetPeriod::Monthly,
                regions: regions.iter().map(|r| r.to_string()).collect(),
                resource_types: resource_types.iter().map(|t| t.to_string()).collect(),
                tags: BTreeMap::from([("owner".to_string(), name.to_ascii_lowercase().replace(' ', "-"))]),
                status,
            }
        })
        .collect()
}
