// Conformance Suite Engine
//
// *La Suite* (The Suite) - Registry of leveled checks and the engine that runs
// them against a serving harness.
//
// A check never aborts the run: failures, panics, and timeouts are recorded
// and the next check starts. Only a harness that cannot serve stops a run.

use crate::config::ConformanceConfig;
use crate::error::{ConformanceError, Result};
use crate::level::{ConformanceLevel, TestCategory};
use chrono::{DateTime, Utc};
use lepasserelle::{CapabilitySet, CostSourceClient, CostSourcePlugin, TestHarness};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Boxed future returned by a check
pub type CheckFuture = Pin<Box<dyn Future<Output = CheckOutcome> + Send + 'static>>;

/// Executable body of a check
pub type CheckFn = Arc<dyn Fn(CheckContext) -> CheckFuture + Send + Sync>;

/// Everything a check may use; cheap to clone
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Client bound to the serving harness
    pub client: CostSourceClient,
    /// Optional methods the plugin implements
    pub capabilities: CapabilitySet,
    /// Level the suite was asked to verify
    pub level: ConformanceLevel,
    /// Plugin name reported at start
    pub plugin_name: String,
    /// Suite configuration
    pub config: Arc<ConformanceConfig>,
}

/// What a check reports back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Whether the check passed
    pub success: bool,
    /// Failure reason
    pub error: Option<String>,
    /// Free-form observations
    pub details: Vec<String>,
}

impl CheckOutcome {
    /// Passing outcome
    pub fn pass() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Failing outcome
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: Vec::new(),
        }
    }

    /// Append an observation
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Pass, or fail with every collected problem
    pub fn from_problems(problems: Vec<String>) -> Self {
        if problems.is_empty() {
            Self::pass()
        } else {
            Self {
                success: false,
                error: Some(problems.join("; ")),
                details: problems,
            }
        }
    }
}

/// A named, leveled check
#[derive(Clone)]
pub struct ConformanceSuiteTest {
    /// Unique name
    pub name: String,
    /// What the check verifies
    pub description: String,
    /// Category for reporting
    pub category: TestCategory,
    /// Lowest level the check runs at
    pub min_level: ConformanceLevel,
    check: CheckFn,
}

impl ConformanceSuiteTest {
    /// Wrap an async check body
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        category: TestCategory,
        min_level: ConformanceLevel,
        check: F,
    ) -> Self
    where
        F: Fn(CheckContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CheckOutcome> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            min_level,
            check: Arc::new(move |ctx: CheckContext| -> CheckFuture { Box::pin(check(ctx)) }),
        }
    }

    /// Whether the check runs when `level` is requested
    pub fn applies_to(&self, level: ConformanceLevel) -> bool {
        self.min_level <= level
    }
}

impl std::fmt::Debug for ConformanceSuiteTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConformanceSuiteTest")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

/// Outcome class of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Ran and passed
    Passed,
    /// Ran and failed, panicked, or timed out
    Failed,
    /// Above the requested level; not run
    Skipped,
}

/// Recorded result of one test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Category
    pub category: TestCategory,
    /// Lowest level the test runs at
    pub min_level: ConformanceLevel,
    /// Outcome
    pub status: TestStatus,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent in the check
    pub duration_ms: f64,
    /// Observations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl TestResult {
    /// Whether the test ran and passed
    pub fn success(&self) -> bool {
        self.status == TestStatus::Passed
    }

    fn skipped(test: &ConformanceSuiteTest) -> Self {
        Self {
            name: test.name.clone(),
            category: test.category,
            min_level: test.min_level,
            status: TestStatus::Skipped,
            error: None,
            duration_ms: 0.0,
            details: Vec::new(),
        }
    }
}

/// Pass/fail/skip counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Registered tests
    pub total: usize,
    /// Ran and passed
    pub passed: usize,
    /// Ran and failed
    pub failed: usize,
    /// Not run
    pub skipped: usize,
}

impl CategorySummary {
    fn record(&mut self, status: TestStatus) {
        self.total += 1;
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Outcome of one suite run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceResult {
    /// Plugin name reported at start
    pub plugin_name: String,
    /// Level the run was asked to verify
    pub requested_level: ConformanceLevel,
    /// Highest level whose tests all passed; `None` if a basic test failed
    pub level_achieved: Option<ConformanceLevel>,
    /// Counts over every test
    pub summary: CategorySummary,
    /// Counts per category
    pub categories: BTreeMap<TestCategory, CategorySummary>,
    /// Wall-clock time for the whole run
    pub duration_ms: f64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Every test, in registration order
    pub results: Vec<TestResult>,
}

impl ConformanceResult {
    /// Whether the requested level was achieved
    pub fn passed(&self) -> bool {
        self.level_achieved
            .is_some_and(|level| level >= self.requested_level)
    }

    /// Tests that ran and failed
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
    }
}

/// Highest level `L <= requested` such that every executed test with
/// `min_level <= L` passed
pub fn level_achieved(
    results: &[TestResult],
    requested: ConformanceLevel,
) -> Option<ConformanceLevel> {
    let mut achieved = None;
    for level in ConformanceLevel::ALL.into_iter().filter(|l| *l <= requested) {
        let clean = results
            .iter()
            .filter(|r| r.status != TestStatus::Skipped && r.min_level <= level)
            .all(TestResult::success);
        if !clean {
            break;
        }
        achieved = Some(level);
    }
    achieved
}

/// Suite lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteState {
    /// Accepting registrations
    Registered,
    /// Executing
    Running,
    /// Result available; registrations accepted again for a further run
    Completed,
}

/// Registry and runner
#[derive(Debug)]
pub struct ConformanceSuite {
    tests: Vec<ConformanceSuiteTest>,
    config: Arc<ConformanceConfig>,
    state: SuiteState,
}

impl ConformanceSuite {
    /// Empty suite with default configuration
    pub fn new() -> Self {
        Self::with_config(ConformanceConfig::default())
    }

    /// Empty suite with explicit configuration
    pub fn with_config(config: ConformanceConfig) -> Self {
        Self {
            tests: Vec::new(),
            config: Arc::new(config),
            state: SuiteState::Registered,
        }
    }

    /// Add a test. Names must be unique.
    pub fn register(&mut self, test: ConformanceSuiteTest) -> Result<()> {
        if self.tests.iter().any(|t| t.name == test.name) {
            return Err(ConformanceError::DuplicateTest(test.name));
        }
        self.tests.push(test);
        Ok(())
    }

    /// Registered tests in registration order
    pub fn tests(&self) -> &[ConformanceSuiteTest] {
        &self.tests
    }

    /// Tests that run when `level` is requested
    pub fn tests_for(&self, level: ConformanceLevel) -> impl Iterator<Item = &ConformanceSuiteTest> {
        self.tests.iter().filter(move |t| t.applies_to(level))
    }

    /// Lifecycle state
    pub fn state(&self) -> SuiteState {
        self.state
    }

    /// Configuration handed to every check
    pub fn config(&self) -> &ConformanceConfig {
        &self.config
    }

    /// Run every applicable test against a serving harness
    pub async fn run(
        &mut self,
        harness: &TestHarness,
        level: ConformanceLevel,
    ) -> Result<ConformanceResult> {
        let client = harness.client()?;
        let ctx = CheckContext {
            client,
            capabilities: harness.capabilities(),
            level,
            plugin_name: harness.plugin_name(),
            config: Arc::clone(&self.config),
        };

        self.state = SuiteState::Running;
        let started_at = Utc::now();
        let started = Instant::now();
        let test_timeout = self.config.test_timeout();

        info!(
            plugin_name = %ctx.plugin_name,
            level = %level,
            tests = self.tests.len(),
            "conformance run starting"
        );

        let mut results = Vec::with_capacity(self.tests.len());
        for test in &self.tests {
            if !test.applies_to(level) {
                debug!(test_name = %test.name, level = %test.min_level, "skipped");
                results.push(TestResult::skipped(test));
                continue;
            }
            results.push(execute(test, ctx.clone(), test_timeout).await);
        }

        let mut summary = CategorySummary::default();
        let mut categories: BTreeMap<TestCategory, CategorySummary> = BTreeMap::new();
        for result in &results {
            summary.record(result.status);
            categories.entry(result.category).or_default().record(result.status);
        }

        let result = ConformanceResult {
            plugin_name: ctx.plugin_name,
            requested_level: level,
            level_achieved: level_achieved(&results, level),
            summary,
            categories,
            duration_ms: millis(started.elapsed()),
            started_at,
            results,
        };

        info!(
            level = %level,
            achieved = ?result.level_achieved,
            passed = result.summary.passed,
            failed = result.summary.failed,
            skipped = result.summary.skipped,
            duration_ms = result.duration_ms,
            "conformance run completed"
        );

        self.state = SuiteState::Completed;
        Ok(result)
    }
}

impl Default for ConformanceSuite {
    fn default() -> Self {
        Self::new()
    }
}

async fn execute(test: &ConformanceSuiteTest, ctx: CheckContext, timeout: Duration) -> TestResult {
    let started = Instant::now();
    let mut handle = tokio::spawn((test.check)(ctx));

    let outcome = match tokio::time::timeout(timeout, &mut handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => CheckOutcome::fail(format!("check panicked: {join_err}")),
        Err(_) => {
            handle.abort();
            CheckOutcome::fail(format!("check timed out after {}ms", timeout.as_millis()))
        }
    };
    let duration_ms = millis(started.elapsed());

    if outcome.success {
        info!(
            test_name = %test.name,
            category = %test.category,
            level = %test.min_level,
            duration_ms,
            "passed"
        );
    } else {
        warn!(
            test_name = %test.name,
            category = %test.category,
            level = %test.min_level,
            duration_ms,
            error = outcome.error.as_deref().unwrap_or_default(),
            "failed"
        );
    }

    TestResult {
        name: test.name.clone(),
        category: test.category,
        min_level: test.min_level,
        status: if outcome.success {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        },
        error: outcome.error,
        duration_ms,
        details: outcome.details,
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Start a harness over `plugin`, run `suite` at `level`, and stop the harness.
///
/// Fails only when the harness cannot start.
pub async fn run_plugin<P>(
    suite: &mut ConformanceSuite,
    plugin: P,
    level: ConformanceLevel,
) -> Result<ConformanceResult>
where
    P: CostSourcePlugin + 'static,
{
    let harness = TestHarness::with_config(plugin, suite.config().harness_config());
    harness.start().await?;
    let result = suite.run(&harness, level).await;
    harness.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, min_level: ConformanceLevel, status: TestStatus) -> TestResult {
        TestResult {
            name: name.to_string(),
            category: TestCategory::RpcCorrectness,
            min_level,
            status,
            error: None,
            duration_ms: 0.0,
            details: Vec::new(),
        }
    }

    #[test]
    fn test_level_achieved_all_pass() {
        let results = vec![
            result("a", ConformanceLevel::Basic, TestStatus::Passed),
            result("b", ConformanceLevel::Standard, TestStatus::Passed),
            result("c", ConformanceLevel::Advanced, TestStatus::Passed),
        ];
        assert_eq!(
            level_achieved(&results, ConformanceLevel::Advanced),
            Some(ConformanceLevel::Advanced)
        );
        assert_eq!(
            level_achieved(&results, ConformanceLevel::Standard),
            Some(ConformanceLevel::Standard)
        );
    }

    #[test]
    fn test_standard_failure_caps_at_basic() {
        let results = vec![
            result("a", ConformanceLevel::Basic, TestStatus::Passed),
            result("b", ConformanceLevel::Standard, TestStatus::Failed),
            result("c", ConformanceLevel::Advanced, TestStatus::Passed),
        ];
        assert_eq!(
            level_achieved(&results, ConformanceLevel::Advanced),
            Some(ConformanceLevel::Basic)
        );
    }

    #[test]
    fn test_basic_failure_achieves_nothing() {
        let results = vec![
            result("a", ConformanceLevel::Basic, TestStatus::Failed),
            result("b", ConformanceLevel::Standard, TestStatus::Passed),
        ];
        assert_eq!(level_achieved(&results, ConformanceLevel::Advanced), None);
    }

    #[test]
    fn test_skipped_tests_do_not_count() {
        let results = vec![
            result("a", ConformanceLevel::Basic, TestStatus::Passed),
            result("b", ConformanceLevel::Advanced, TestStatus::Skipped),
        ];
        assert_eq!(
            level_achieved(&results, ConformanceLevel::Basic),
            Some(ConformanceLevel::Basic)
        );
    }

    #[test]
    fn test_outcome_from_problems() {
        assert!(CheckOutcome::from_problems(Vec::new()).success);
        let failed = CheckOutcome::from_problems(vec!["a".into(), "b".into()]);
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("a; b"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut suite = ConformanceSuite::new();
        let make = || {
            ConformanceSuiteTest::new(
                "same",
                "",
                TestCategory::SpecValidation,
                ConformanceLevel::Basic,
                |_ctx| async { CheckOutcome::pass() },
            )
        };
        suite.register(make()).unwrap();
        assert!(matches!(
            suite.register(make()),
            Err(ConformanceError::DuplicateTest(name)) if name == "same"
        ));
        assert_eq!(suite.tests().len(), 1);
        assert_eq!(suite.state(), SuiteState::Registered);
    }
}
