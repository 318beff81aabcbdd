// Field Validators
//
// Presence and format predicates for request and response fields. Each
// returns a typed error or a list of violations; none has side effects.

use crate::error::{CoutError, Result};
use crate::model::{billing_mode, PricingSpec, RecommendationFilter, ResourceDescriptor};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of target resources in one batch query
pub const MAX_TARGET_RESOURCES: usize = 100;

/// `provider:module/resource:Type`, e.g. `aws:ec2/instance:Instance`
static RESOURCE_TYPE_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]*:[A-Za-z0-9_.-]+(/[A-Za-z0-9_.-]+)*:[A-Za-z][A-Za-z0-9]*$").ok()
});

/// Three upper-case ASCII letters
pub fn is_valid_currency(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// One of the recognised billing modes
pub fn is_valid_billing_mode(mode: &str) -> bool {
    billing_mode::ALL.contains(&mode)
}

/// Whether a resource type token has the `provider:module/resource:Type` shape
pub fn is_valid_resource_type_token(token: &str) -> bool {
    RESOURCE_TYPE_TOKEN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(token))
}

/// Require a resource with provider and resource type set
pub fn validate_resource(resource: Option<&ResourceDescriptor>) -> Result<&ResourceDescriptor> {
    let resource = resource.ok_or_else(|| CoutError::validation("resource", "is required"))?;
    validate_descriptor_fields(resource, "resource")?;
    Ok(resource)
}

fn validate_descriptor_fields(resource: &ResourceDescriptor, path: &str) -> Result<()> {
    if resource.provider.trim().is_empty() {
        return Err(CoutError::validation(format!("{path}.provider"), "is required"));
    }
    if resource.resource_type.trim().is_empty() {
        return Err(CoutError::validation(
            format!("{path}.resource_type"),
            "is required",
        ));
    }
    Ok(())
}

/// Require both ends of a time range, with `end >= start`
pub fn validate_time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start.ok_or_else(|| CoutError::validation("start", "is required"))?;
    let end = end.ok_or_else(|| CoutError::validation("end", "is required"))?;
    if end < start {
        return Err(CoutError::InvalidTimeRange { start, end });
    }
    Ok((start, end))
}

/// Bound the batch scope and require the matching fields on every target
pub fn validate_target_resources(targets: &[ResourceDescriptor]) -> Result<()> {
    if targets.len() > MAX_TARGET_RESOURCES {
        return Err(CoutError::TooManyTargets {
            count: targets.len(),
            limit: MAX_TARGET_RESOURCES,
        });
    }
    for (index, target) in targets.iter().enumerate() {
        validate_descriptor_fields(target, &format!("target_resources[{index}]"))?;
    }
    Ok(())
}

/// Reject thresholds outside their domain
pub fn validate_filter(filter: &RecommendationFilter) -> Result<()> {
    if !(0.0..=1.0).contains(&filter.min_confidence_score) {
        return Err(CoutError::validation(
            "filter.min_confidence_score",
            "must be within [0, 1]",
        ));
    }
    if filter.min_estimated_savings.is_nan() {
        return Err(CoutError::validation(
            "filter.min_estimated_savings",
            "must be a number",
        ));
    }
    Ok(())
}

/// Schema violations in a pricing spec; empty when valid
pub fn pricing_spec_violations(spec: &PricingSpec) -> Vec<String> {
    let mut violations = Vec::new();

    if spec.provider.is_empty() {
        violations.push("provider is empty".to_string());
    }
    if spec.resource_type.is_empty() {
        violations.push("resource_type is empty".to_string());
    }
    if !is_valid_billing_mode(&spec.billing_mode) {
        violations.push(format!("unknown billing_mode '{}'", spec.billing_mode));
    }
    if !spec.rate_per_unit.is_finite() || spec.rate_per_unit < 0.0 {
        violations.push(format!("rate_per_unit {} is negative or not finite", spec.rate_per_unit));
    }
    if !is_valid_currency(&spec.currency) {
        violations.push(format!("currency '{}' is not an ISO 4217 code", spec.currency));
    }
    if spec.billing_mode == billing_mode::NOT_IMPLEMENTED && spec.assumptions.is_empty() {
        violations.push("not_implemented spec must explain itself in assumptions".to_string());
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case("USD", true)]
    #[case("EUR", true)]
    #[case("usd", false)]
    #[case("US", false)]
    #[case("USDX", false)]
    #[case("", false)]
    fn test_currency(#[case] code: &str, #[case] expected: bool) {
        assert_eq!(is_valid_currency(code), expected);
    }

    #[rstest]
    #[case("aws:ec2/instance:Instance", true)]
    #[case("gcp:compute/instance:Instance", true)]
    #[case("azure-native:compute:VirtualMachine", true)]
    #[case("ec2", false)]
    #[case("aws:ec2/instance:", false)]
    #[case(":ec2/instance:Instance", false)]
    fn test_resource_type_token(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(is_valid_resource_type_token(token), expected);
    }

    #[test]
    fn test_validate_resource() {
        assert!(validate_resource(None).is_err());

        let missing_type = ResourceDescriptor::new("aws", "");
        let err = validate_resource(Some(&missing_type)).unwrap_err();
        assert_eq!(err.field(), Some("resource.resource_type"));

        let ok = ResourceDescriptor::new("aws", "ec2");
        assert!(validate_resource(Some(&ok)).is_ok());
    }

    #[test]
    fn test_time_range() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);

        assert!(validate_time_range(Some(start), Some(end)).is_ok());
        assert!(validate_time_range(Some(start), Some(start)).is_ok());
        assert!(matches!(
            validate_time_range(Some(end), Some(start)),
            Err(CoutError::InvalidTimeRange { .. })
        ));
        assert!(validate_time_range(None, Some(end)).is_err());
    }

    #[test]
    fn test_target_limit() {
        let targets = vec![ResourceDescriptor::new("aws", "ec2"); MAX_TARGET_RESOURCES];
        assert!(validate_target_resources(&targets).is_ok());

        let too_many = vec![ResourceDescriptor::new("aws", "ec2"); MAX_TARGET_RESOURCES + 1];
        assert!(matches!(
            validate_target_resources(&too_many),
            Err(CoutError::TooManyTargets { count: 101, limit: 100 })
        ));

        let incomplete = vec![ResourceDescriptor::new("", "ec2")];
        let err = validate_target_resources(&incomplete).unwrap_err();
        assert_eq!(err.field(), Some("target_resources[0].provider"));
    }

    #[test]
    fn test_filter_confidence_domain() {
        let bad = RecommendationFilter {
            min_confidence_score: 1.5,
            ..RecommendationFilter::default()
        };
        assert!(validate_filter(&bad).is_err());
        assert!(validate_filter(&RecommendationFilter::default()).is_ok());
    }

    #[test]
    fn test_pricing_spec_violations() {
        let spec = PricingSpec {
            provider: "aws".to_string(),
            resource_type: "ec2".to_string(),
            billing_mode: billing_mode::PER_HOUR.to_string(),
            rate_per_unit: 0.0416,
            currency: "USD".to_string(),
            ..PricingSpec::default()
        };
        assert!(pricing_spec_violations(&spec).is_empty());

        let broken = PricingSpec {
            billing_mode: "hourly-ish".to_string(),
            rate_per_unit: -1.0,
            currency: "dollars".to_string(),
            ..spec
        };
        assert_eq!(pricing_spec_violations(&broken).len(), 3);
    }
}
