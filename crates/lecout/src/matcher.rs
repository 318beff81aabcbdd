// Resource Matching
//
// *Le Périmètre* (The Scope) - Decide which recommendation records fall inside
// a batch query's target resources.

use crate::model::{Recommendation, ResourceDescriptor, ResourceRecommendationInfo};

/// Whether `candidate` matches `target`.
///
/// Provider and resource type must always be equal. SKU and region only
/// constrain when set on the target. Target tags must be a subset of the
/// candidate's tags.
pub fn matches(candidate: &ResourceRecommendationInfo, target: &ResourceDescriptor) -> bool {
    if candidate.provider != target.provider || candidate.resource_type != target.resource_type {
        return false;
    }

    if !target.sku.is_empty() && candidate.sku != target.sku {
        return false;
    }

    if !target.region.is_empty() && candidate.region != target.region {
        return false;
    }

    target
        .tags
        .iter()
        .all(|(key, value)| candidate.tags.get(key) == Some(value))
}

/// OR across targets: true if any target matches
pub fn matches_any(candidate: &ResourceRecommendationInfo, targets: &[ResourceDescriptor]) -> bool {
    targets.iter().any(|target| matches(candidate, target))
}

/// Restrict `records` to the batch scope defined by `targets`.
///
/// An empty target list leaves the records unscoped. Each record is visited
/// once, so duplicate targets never duplicate results.
pub fn scope(records: &[Recommendation], targets: &[ResourceDescriptor]) -> Vec<Recommendation> {
    if targets.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| matches_any(&record.resource, targets))
        .cloned()
        .collect()
}
