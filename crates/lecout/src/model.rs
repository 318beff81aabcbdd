// Cost-Source Records
//
// *Le Modèle* (The Model) - Resources, recommendations, pricing, and budgets
//
// Records are treated as opaque structured data by the harness. Only the
// fields scoping, filtering, pagination, and aggregation read are interpreted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies a resource to price or recommend for.
///
/// `provider` and `resource_type` are required. `sku`, `region`, and `tags`
/// only constrain matching when set on the target side. `id` and `arn` are
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDescriptor {
    /// Client correlation token, never interpreted
    pub id: String,
    /// Cloud provider, e.g. `aws`
    pub provider: String,
    /// Provider resource type, e.g. `ec2`
    pub resource_type: String,
    /// Optional SKU / instance size
    pub sku: String,
    /// Optional region
    pub region: String,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
    /// Canonical provider identifier for exact lookup
    pub arn: String,
}

impl ResourceDescriptor {
    /// Create a descriptor with the two required fields
    pub fn new(provider: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Set the SKU
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    /// Set the region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the correlation id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the canonical identifier
    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = arn.into();
        self
    }
}

/// Resource a recommendation applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceRecommendationInfo {
    /// Provider resource id
    pub id: String,
    /// Display name
    pub name: String,
    /// Cloud provider
    pub provider: String,
    /// Provider resource type
    pub resource_type: String,
    /// Region
    pub region: String,
    /// SKU / instance size
    pub sku: String,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

/// Recommendation category.
///
/// Names used as summary keys come from [`RecommendationCategory::as_str`] only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationCategory {
    /// Sentinel: no category / no constraint
    #[default]
    Unspecified,
    /// Spend reduction
    Cost,
    /// Performance improvement
    Performance,
    /// Security posture
    Security,
    /// Reliability / availability
    Reliability,
    /// Detected spending anomaly
    Anomaly,
}

impl RecommendationCategory {
    /// All categories, sentinel first
    pub const ALL: [Self; 6] = [
        Self::Unspecified,
        Self::Cost,
        Self::Performance,
        Self::Security,
        Self::Reliability,
        Self::Anomaly,
    ];

    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Cost => "COST",
            Self::Performance => "PERFORMANCE",
            Self::Security => "SECURITY",
            Self::Reliability => "RELIABILITY",
            Self::Anomaly => "ANOMALY",
        }
    }

    /// Parse from a canonical or lowercase name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }

    /// True for the sentinel value
    pub fn is_unspecified(self) -> bool {
        self == Self::Unspecified
    }
}

/// Suggested action kind
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Sentinel: no action / no constraint
    #[default]
    Unspecified,
    /// Change instance size
    Rightsize,
    /// Remove the resource
    Terminate,
    /// Buy reserved capacity or savings plans
    PurchaseCommitment,
    /// Tune container requests/limits
    AdjustRequests,
    /// Change configuration in place
    Modify,
    /// Delete an unattached / idle resource
    DeleteUnused,
    /// Move to another service or generation
    Migrate,
    /// Merge underused resources
    Consolidate,
    /// Run only on a schedule
    Schedule,
    /// Look into an anomaly
    Investigate,
    /// Anything else
    Other,
}

impl ActionType {
    /// All action types, sentinel first
    pub const ALL: [Self; 12] = [
        Self::Unspecified,
        Self::Rightsize,
        Self::Terminate,
        Self::PurchaseCommitment,
        Self::AdjustRequests,
        Self::Modify,
        Self::DeleteUnused,
        Self::Migrate,
        Self::Consolidate,
        Self::Schedule,
        Self::Investigate,
        Self::Other,
    ];

    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Rightsize => "RIGHTSIZE",
            Self::Terminate => "TERMINATE",
            Self::PurchaseCommitment => "PURCHASE_COMMITMENT",
            Self::AdjustRequests => "ADJUST_REQUESTS",
            Self::Modify => "MODIFY",
            Self::DeleteUnused => "DELETE_UNUSED",
            Self::Migrate => "MIGRATE",
            Self::Consolidate => "CONSOLIDATE",
            Self::Schedule => "SCHEDULE",
            Self::Investigate => "INVESTIGATE",
            Self::Other => "OTHER",
        }
    }

    /// Parse from a canonical or lowercase name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(value))
    }

    /// True for the sentinel value
    pub fn is_unspecified(self) -> bool {
        self == Self::Unspecified
    }
}

/// Recommendation priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Sentinel: no priority / no constraint
    #[default]
    Unspecified,
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl Priority {
    /// Canonical name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// True for the sentinel value
    pub fn is_unspecified(self) -> bool {
        self == Self::Unspecified
    }
}

/// Estimated financial impact of acting on a recommendation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Impact {
    /// Signed savings; negative values represent overspend anomalies
    pub estimated_savings: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Period the savings are projected over, e.g. `monthly`
    pub projection_period: String,
}

/// Optimization suggestion or detected anomaly.
///
/// Immutable once returned; filtering and slicing build new collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    /// Unique within a response
    pub id: String,
    /// Category
    pub category: RecommendationCategory,
    /// Suggested action
    pub action_type: ActionType,
    /// Priority
    pub priority: Priority,
    /// Affected resource
    pub resource: ResourceRecommendationInfo,
    /// Financial impact, if estimated
    pub impact: Option<Impact>,
    /// Confidence in `[0, 1]`, if known
    pub confidence_score: Option<f64>,
    /// Human-readable description
    pub description: String,
    /// Originating engine, e.g. `aws-compute-optimizer`
    pub source: String,
    /// Billing account
    pub account_id: String,
    /// When the recommendation was generated
    pub created_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    /// Estimated savings, zero when no impact is attached
    pub fn estimated_savings(&self) -> f64 {
        self.impact.as_ref().map_or(0.0, |i| i.estimated_savings)
    }
}

/// Field used to order recommendations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    /// Keep the plugin's deterministic order
    #[default]
    Unspecified,
    /// Estimated savings
    EstimatedSavings,
    /// Priority
    Priority,
    /// Confidence score
    ConfidenceScore,
    /// Creation time
    CreatedAt,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Descending unless otherwise requested
    #[default]
    Unspecified,
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// Selection criteria for recommendations.
///
/// Empty strings, sentinel enums, and zero thresholds mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationFilter {
    /// Exact provider
    pub provider: String,
    /// Exact region
    pub region: String,
    /// Exact resource type
    pub resource_type: String,
    /// Category
    pub category: RecommendationCategory,
    /// Action type
    pub action_type: ActionType,
    /// Priority
    pub priority: Priority,
    /// Minimum estimated savings (inclusive)
    pub min_estimated_savings: f64,
    /// Minimum confidence score (inclusive)
    pub min_confidence_score: f64,
    /// Maximum age in days (inclusive)
    pub max_age_days: u32,
    /// Exact billing account
    pub account_id: String,
    /// Exact source engine
    pub source: String,
    /// Exact resource id
    pub resource_id: String,
    /// Ordering field
    pub sort_by: SortBy,
    /// Ordering direction
    pub sort_order: SortOrder,
}

/// Hint telling the caller whether to fall back to another cost source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackHint {
    /// Not stated
    #[default]
    Unspecified,
    /// Data is authoritative
    None,
    /// Another source may have better data
    Recommended,
    /// This source cannot answer
    Required,
}

/// One historical cost observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostPoint {
    /// Start of the period the cost covers
    pub timestamp: DateTime<Utc>,
    /// Cost in the response currency
    pub cost: f64,
    /// Usage quantity for the period
    pub usage_amount: f64,
    /// Usage unit, e.g. `hour`
    pub usage_unit: String,
    /// Where the figure came from
    pub source: String,
}

/// Billing modes a pricing spec may declare
pub mod billing_mode {
    /// Hourly rate
    pub const PER_HOUR: &str = "per_hour";
    /// Storage rate per GB-month
    pub const PER_GB_MONTH: &str = "per_gb_month";
    /// Per request
    pub const PER_REQUEST: &str = "per_request";
    /// Fixed monthly fee
    pub const FLAT: &str = "flat";
    /// Plugin has no pricing for this resource
    pub const NOT_IMPLEMENTED: &str = "not_implemented";

    /// Every recognised mode
    pub const ALL: [&str; 5] = [PER_HOUR, PER_GB_MONTH, PER_REQUEST, FLAT, NOT_IMPLEMENTED];
}

/// Pricing specification for one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSpec {
    /// Cloud provider
    pub provider: String,
    /// Resource type
    pub resource_type: String,
    /// SKU
    pub sku: String,
    /// Region
    pub region: String,
    /// One of [`billing_mode::ALL`]
    pub billing_mode: String,
    /// Price per billing unit
    pub rate_per_unit: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Human-readable description
    pub description: String,
    /// Assumptions behind the rate
    pub assumptions: Vec<String>,
    /// Plugin that produced the spec
    pub plugin_name: String,
    /// Pricing data source
    pub source: String,
}

/// Budget period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetPeriod {
    /// Not stated
    #[default]
    Unspecified,
    /// Calendar month
    Monthly,
    /// Calendar quarter
    Quarterly,
    /// Calendar year
    Annually,
}

/// Budget health derived from spend against limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetHealth {
    /// Not evaluated
    #[default]
    Unspecified,
    /// Below 80 % used
    Ok,
    /// 80 % to 90 % used
    Warning,
    /// 90 % to 100 % used
    Critical,
    /// At or over the limit
    Exceeded,
}

impl BudgetHealth {
    /// Classify a percentage of the limit already spent
    pub fn from_percentage(percentage_used: f64) -> Self {
        if percentage_used >= 100.0 {
            Self::Exceeded
        } else if percentage_used >= 90.0 {
            Self::Critical
        } else if percentage_used >= 80.0 {
            Self::Warning
        } else {
            Self::Ok
        }
    }
}

/// Budget limit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetAmount {
    /// Spending limit
    pub limit: f64,
    /// ISO 4217 currency code
    pub currency: String,
}

/// Spend status of a budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetStatus {
    /// Spend so far in the period
    pub current_spend: f64,
    /// Forecast spend at period end
    pub forecasted_spend: f64,
    /// `current_spend / limit * 100`
    pub percentage_used: f64,
    /// `forecasted_spend / limit * 100`
    pub percentage_forecasted: f64,
    /// Health bucket
    pub health: BudgetHealth,
}

/// Spending budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Budget id
    pub id: String,
    /// Display name
    pub name: String,
    /// Cloud provider the budget lives in
    pub provider: String,
    /// Origin system, e.g. `aws-budgets`
    pub source: String,
    /// Limit
    pub amount: BudgetAmount,
    /// Period
    pub period: BudgetPeriod,
    /// Regions the budget covers (empty = all)
    pub regions: Vec<String>,
    /// Resource types the budget covers (empty = all)
    pub resource_types: Vec<String>,
    /// Budget tags
    pub tags: BTreeMap<String, String>,
    /// Spend status, present only when requested
    pub status: Option<BudgetStatus>,
}

/// Selection criteria for budgets; empty lists mean "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetFilter {
    /// Any of these providers
    pub providers: Vec<String>,
    /// Any of these regions
    pub regions: Vec<String>,
    /// Any of these resource types
    pub resource_types: Vec<String>,
    /// All of these tags
    pub tags: BTreeMap<String, String>,
}

impl BudgetFilter {
    /// Whether a budget satisfies every specified criterion
    pub fn matches(&self, budget: &Budget) -> bool {
        if !self.providers.is_empty() && !self.providers.contains(&budget.provider) {
            return false;
        }
        if !self.regions.is_empty()
            && !budget.regions.is_empty()
            && !budget.regions.iter().any(|r| self.regions.contains(r))
        {
            return false;
        }
        if !self.resource_types.is_empty()
            && !budget.resource_types.is_empty()
            && !budget
                .resource_types
                .iter()
                .any(|t| self.resource_types.contains(t))
        {
            return false;
        }
        self.tags
            .iter()
            .all(|(k, v)| budget.tags.get(k) == Some(v))
    }
}
