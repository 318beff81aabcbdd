// Latency Baselines
//
// Per-method latency ceilings. The advanced threshold is always the
// stricter of the two.

use crate::level::ConformanceLevel;
use lecout::RpcMethod;
use serde::Serialize;
use std::time::Duration;

/// Latency ceilings for one RPC method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LatencyBaseline {
    /// Method the baseline applies to
    pub method: RpcMethod,
    /// Ceiling at the standard level
    pub standard: Duration,
    /// Ceiling at the advanced level
    pub advanced: Duration,
}

impl LatencyBaseline {
    const fn new(method: RpcMethod, standard_ms: u64, advanced_ms: u64) -> Self {
        Self {
            method,
            standard: Duration::from_millis(standard_ms),
            advanced: Duration::from_millis(advanced_ms),
        }
    }

    /// Ceiling for `level`; basic uses the standard ceiling
    pub fn threshold(&self, level: ConformanceLevel) -> Duration {
        match level {
            ConformanceLevel::Advanced => self.advanced,
            ConformanceLevel::Basic | ConformanceLevel::Standard => self.standard,
        }
    }
}

static BASELINES: [LatencyBaseline; 8] = [
    LatencyBaseline::new(RpcMethod::Name, 100, 50),
    LatencyBaseline::new(RpcMethod::Supports, 100, 50),
    LatencyBaseline::new(RpcMethod::GetActualCost, 2_000, 1_000),
    LatencyBaseline::new(RpcMethod::GetProjectedCost, 200, 100),
    LatencyBaseline::new(RpcMethod::GetPricingSpec, 200, 100),
    LatencyBaseline::new(RpcMethod::GetRecommendations, 500, 250),
    LatencyBaseline::new(RpcMethod::GetBudgets, 500, 250),
    LatencyBaseline::new(RpcMethod::EstimateCost, 500, 200),
];

/// The full table in service order
pub fn all() -> &'static [LatencyBaseline] {
    &BASELINES
}

/// Baseline for `method`
pub fn for_method(method: RpcMethod) -> Option<&'static LatencyBaseline> {
    BASELINES.iter().find(|b| b.method == method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_method_has_a_baseline() {
        for method in RpcMethod::ALL {
            assert!(for_method(method).is_some(), "{method} has no baseline");
        }
    }

    #[test]
    fn test_advanced_is_stricter() {
        for baseline in all() {
            assert!(baseline.advanced <= baseline.standard, "{}", baseline.method);
        }
    }

    #[test]
    fn test_threshold_by_level() {
        let name = for_method(RpcMethod::Name).unwrap();
        assert_eq!(name.threshold(ConformanceLevel::Standard), Duration::from_millis(100));
        assert_eq!(name.threshold(ConformanceLevel::Advanced), Duration::from_millis(50));
    }
}
