// RPC Messages
//
// Typed request/response payloads for the CostSource service. Optional
// fields model "nil" on the wire: a missing resource deserialises to `None`.

use crate::model::{
    Budget, BudgetFilter, BudgetHealth, CostPoint, FallbackHint, PricingSpec, Recommendation,
    RecommendationFilter, ResourceDescriptor,
};
use crate::summary::RecommendationSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CostSource RPC methods
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RpcMethod {
    /// `Name`
    Name,
    /// `Supports`
    Supports,
    /// `GetActualCost`
    GetActualCost,
    /// `GetProjectedCost`
    GetProjectedCost,
    /// `GetPricingSpec`
    GetPricingSpec,
    /// `GetRecommendations`
    GetRecommendations,
    /// `GetBudgets`
    GetBudgets,
    /// `EstimateCost`
    EstimateCost,
}

impl RpcMethod {
    /// Every method in service order
    pub const ALL: [Self; 8] = [
        Self::Name,
        Self::Supports,
        Self::GetActualCost,
        Self::GetProjectedCost,
        Self::GetPricingSpec,
        Self::GetRecommendations,
        Self::GetBudgets,
        Self::EstimateCost,
    ];

    /// Methods a plugin may legitimately leave unimplemented
    pub const OPTIONAL: [Self; 3] = [Self::GetRecommendations, Self::GetBudgets, Self::EstimateCost];

    /// Canonical method name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Supports => "Supports",
            Self::GetActualCost => "GetActualCost",
            Self::GetProjectedCost => "GetProjectedCost",
            Self::GetPricingSpec => "GetPricingSpec",
            Self::GetRecommendations => "GetRecommendations",
            Self::GetBudgets => "GetBudgets",
            Self::EstimateCost => "EstimateCost",
        }
    }

    /// Parse a method name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value))
    }

    /// Whether the method belongs to the optional extended subset
    pub fn is_optional(self) -> bool {
        Self::OPTIONAL.contains(&self)
    }
}

impl std::fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Name` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRequest {}

/// `Name` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameResponse {
    /// Plugin name
    pub name: String,
}

/// `Supports` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportsRequest {
    /// Resource to check
    pub resource: Option<ResourceDescriptor>,
}

/// `Supports` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportsResponse {
    /// Whether the plugin can price the resource
    pub supported: bool,
    /// Explanation, expected when unsupported
    pub reason: String,
}

/// `GetActualCost` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetActualCostRequest {
    /// Provider resource id
    pub resource_id: String,
    /// Range start (inclusive)
    pub start: Option<DateTime<Utc>>,
    /// Range end (exclusive)
    pub end: Option<DateTime<Utc>>,
    /// Optional tag scope
    pub tags: BTreeMap<String, String>,
    /// Page size; non-positive selects the default
    pub page_size: i32,
    /// Continuation token; empty starts at the beginning
    pub page_token: String,
}

/// `GetActualCost` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetActualCostResponse {
    /// Cost points for this page
    pub results: Vec<CostPoint>,
    /// Points across all pages
    pub total_count: u64,
    /// Token for the next page, empty when done
    pub next_page_token: String,
    /// Fallback hint
    pub fallback_hint: FallbackHint,
}

/// `GetProjectedCost` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetProjectedCostRequest {
    /// Resource to project
    pub resource: Option<ResourceDescriptor>,
}

/// `GetProjectedCost` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetProjectedCostResponse {
    /// Price per unit
    pub unit_price: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Projected monthly cost
    pub cost_per_month: f64,
    /// How the projection was derived
    pub billing_detail: String,
}

/// `GetPricingSpec` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPricingSpecRequest {
    /// Resource to describe
    pub resource: Option<ResourceDescriptor>,
}

/// `GetPricingSpec` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPricingSpecResponse {
    /// Pricing spec
    pub spec: PricingSpec,
}

/// `GetRecommendations` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetRecommendationsRequest {
    /// Scope: records must match at least one target (empty = unscoped)
    pub target_resources: Vec<ResourceDescriptor>,
    /// Selection within the scope
    pub filter: Option<RecommendationFilter>,
    /// Page size; non-positive selects the default
    pub page_size: i32,
    /// Continuation token; empty starts at the beginning
    pub page_token: String,
    /// Passed through to the summary unchanged
    pub projection_period: String,
}

/// `GetRecommendations` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetRecommendationsResponse {
    /// Recommendations on this page
    pub recommendations: Vec<Recommendation>,
    /// Aggregates over the page or the whole query, per plugin
    pub summary: Option<RecommendationSummary>,
    /// Token for the next page, empty when done
    pub next_page_token: String,
}

/// `GetBudgets` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetBudgetsRequest {
    /// Optional selection
    pub filter: Option<BudgetFilter>,
    /// Whether to compute spend status
    pub include_status: bool,
}

/// Budget counts per health bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSummary {
    /// Budgets returned
    pub total_budgets: u64,
    /// Healthy budgets
    pub budgets_ok: u64,
    /// Budgets in warning
    pub budgets_warning: u64,
    /// Critical budgets
    pub budgets_critical: u64,
    /// Exceeded budgets
    pub budgets_exceeded: u64,
}

impl BudgetSummary {
    /// Count budgets per health bucket; budgets without status only add to the total
    pub fn from_budgets(budgets: &[Budget]) -> Self {
        let mut summary = Self {
            total_budgets: budgets.len() as u64,
            ..Self::default()
        };
        for status in budgets.iter().filter_map(|b| b.status.as_ref()) {
            match status.health {
                BudgetHealth::Ok => summary.budgets_ok += 1,
                BudgetHealth::Warning => summary.budgets_warning += 1,
                BudgetHealth::Critical => summary.budgets_critical += 1,
                BudgetHealth::Exceeded => summary.budgets_exceeded += 1,
                BudgetHealth::Unspecified => {}
            }
        }
        summary
    }
}

/// `GetBudgets` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetBudgetsResponse {
    /// Matching budgets
    pub budgets: Vec<Budget>,
    /// Health counts
    pub summary: BudgetSummary,
}

/// `EstimateCost` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateCostRequest {
    /// Resource type token, `provider:module/resource:Type`
    pub resource_type: String,
    /// Resource attributes (e.g. `instanceType`)
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// `EstimateCost` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateCostResponse {
    /// Estimated monthly cost
    pub cost_monthly: f64,
    /// ISO 4217 currency code
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_roundtrip() {
        for method in RpcMethod::ALL {
            assert_eq!(RpcMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(RpcMethod::parse("getprojectedcost"), Some(RpcMethod::GetProjectedCost));
        assert_eq!(RpcMethod::parse("Unknown"), None);
    }

    #[test]
    fn test_optional_subset() {
        assert!(RpcMethod::GetBudgets.is_optional());
        assert!(!RpcMethod::GetPricingSpec.is_optional());
    }

    #[test]
    fn test_missing_resource_deserialises_to_none() {
        let req: GetProjectedCostRequest = serde_json::from_str("{}").unwrap();
        assert!(req.resource.is_none());

        let req: GetActualCostRequest =
            serde_json::from_str(r#"{"resource_id":"i-123"}"#).unwrap();
        assert_eq!(req.resource_id, "i-123");
        assert!(req.start.is_none());
    }
}
