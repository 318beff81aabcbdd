// Mock Configuration
//
// Immutable once built. Every knob is set before the plugin is handed to a
// harness; the plugin only ever reads it.

use chrono::{DateTime, TimeZone, Utc};
use lecout::{Recommendation, RpcMethod};
use lepasserelle::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Default plugin name
pub const DEFAULT_PLUGIN_NAME: &str = "mock-plugin";

/// Default size of the synthetic recommendation set
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 60;

/// Which records the recommendation summary covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryScope {
    /// Only the records on the returned page
    #[default]
    Page,
    /// Every record in scope and selection, before pagination
    Query,
}

impl SummaryScope {
    /// Parse `page` or `query`
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "page" => Some(Self::Page),
            "query" => Some(Self::Query),
            _ => None,
        }
    }
}

/// Behaviour of a [`crate::MockPlugin`]
#[derive(Debug, Clone)]
pub struct MockConfig {
    name: String,
    errors: BTreeSet<RpcMethod>,
    error_code: StatusCode,
    delays: BTreeMap<RpcMethod, Duration>,
    spikes: BTreeMap<RpcMethod, (usize, Duration)>,
    unimplemented: BTreeSet<RpcMethod>,
    recommendation_count: usize,
    recommendations: Option<Vec<Recommendation>>,
    summary_scope: SummaryScope,
    reference_time: DateTime<Utc>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PLUGIN_NAME.to_string(),
            errors: BTreeSet::new(),
            error_code: StatusCode::Unavailable,
            delays: BTreeMap::new(),
            spikes: BTreeMap::new(),
            unimplemented: BTreeSet::new(),
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            recommendations: None,
            summary_scope: SummaryScope::Page,
            reference_time: default_reference_time(),
        }
    }
}

/// Fixed "now" so age filters and synthetic timestamps are reproducible
fn default_reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

impl MockConfig {
    /// Defaults: no errors, no delays, every method implemented
    pub fn new() -> Self {
        Self::default()
    }

    /// Name reported by `Name`
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make `method` fail with the configured error code
    pub fn with_error(mut self, method: RpcMethod) -> Self {
        self.errors.insert(method);
        self
    }

    /// Code returned by error-injected methods
    pub fn with_error_code(mut self, code: StatusCode) -> Self {
        self.error_code = code;
        self
    }

    /// Delay every call to `method`
    pub fn with_delay(mut self, method: RpcMethod, delay: Duration) -> Self {
        self.delays.insert(method, delay);
        self
    }

    /// Delay every `every`-th call to `method`, counting from the first
    pub fn with_latency_spike(mut self, method: RpcMethod, every: usize, delay: Duration) -> Self {
        self.spikes.insert(method, (every.max(1), delay));
        self
    }

    /// Answer `method` with `UNIMPLEMENTED`
    pub fn without(mut self, method: RpcMethod) -> Self {
        self.unimplemented.insert(method);
        self
    }

    /// Size of the synthetic recommendation set
    pub fn with_recommendation_count(mut self, count: usize) -> Self {
        self.recommendation_count = count;
        self
    }

    /// Serve these records instead of synthetic ones
    pub fn with_recommendations(mut self, records: Vec<Recommendation>) -> Self {
        self.recommendations = Some(records);
        self
    }

    /// Summary scope
    pub fn with_summary_scope(mut self, scope: SummaryScope) -> Self {
        self.summary_scope = scope;
        self
    }

    /// Clock used for age filtering and synthetic timestamps
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = now;
        self
    }

    /// Plugin name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `method` has an injected error
    pub fn fails(&self, method: RpcMethod) -> bool {
        self.errors.contains(&method)
    }

    /// Code for injected errors
    pub fn error_code(&self) -> StatusCode {
        self.error_code
    }

    /// Delay for `method`, if any
    pub fn delay(&self, method: RpcMethod) -> Option<Duration> {
        self.delays.get(&method).copied()
    }

    /// Period and extra delay of the spike on `method`, if any
    pub fn latency_spike(&self, method: RpcMethod) -> Option<(usize, Duration)> {
        self.spikes.get(&method).copied()
    }

    /// Whether `method` answers `UNIMPLEMENTED`
    pub fn is_unimplemented(&self, method: RpcMethod) -> bool {
        self.unimplemented.contains(&method)
    }

    /// Synthetic recommendation count
    pub fn recommendation_count(&self) -> usize {
        self.recommendation_count
    }

    /// Caller-supplied records, if any
    pub fn recommendations(&self) -> Option<&[Recommendation]> {
        self.recommendations.as_deref()
    }

    /// Summary scope
    pub fn summary_scope(&self) -> SummaryScope {
        self.summary_scope
    }

    /// Reference clock
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }
}
