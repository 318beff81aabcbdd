// Integration Tests for the Suite Engine
//
// Custom checks registered against the mock plugin, exercising skip
// accounting, level computation, and isolation of panicking or hanging checks.

use leconformite::{
    run_plugin, CheckContext, CheckOutcome, ConformanceConfig, ConformanceError, ConformanceLevel,
    ConformanceSuite, ConformanceSuiteTest, TestCategory, TestStatus,
};
use leconformite::suite::SuiteState;
use lepasserelle::TestHarness;
use lesimulacre::MockPlugin;
use std::future::Future;
use std::time::Duration;

async fn passing(_ctx: CheckContext) -> CheckOutcome {
    CheckOutcome::pass()
}

async fn failing(_ctx: CheckContext) -> CheckOutcome {
    CheckOutcome::fail("deliberate failure")
}

async fn panicking(_ctx: CheckContext) -> CheckOutcome {
    panic!("check blew up");
}

async fn hanging(_ctx: CheckContext) -> CheckOutcome {
    tokio::time::sleep(Duration::from_secs(30)).await;
    CheckOutcome::pass()
}

fn test<F, Fut>(name: &str, level: ConformanceLevel, check: F) -> ConformanceSuiteTest
where
    F: Fn(CheckContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CheckOutcome> + Send + 'static,
{
    ConformanceSuiteTest::new(name, name, TestCategory::RpcCorrectness, level, check)
}

fn suite_with(tests: Vec<ConformanceSuiteTest>) -> ConformanceSuite {
    let mut config = ConformanceConfig::default();
    config.suite.test_timeout_ms = 200;
    let mut suite = ConformanceSuite::with_config(config);
    for t in tests {
        suite.register(t).unwrap();
    }
    suite
}

mod level_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_passing_reaches_requested_level() {
        let mut suite = suite_with(vec![
            test("basic", ConformanceLevel::Basic, passing),
            test("standard", ConformanceLevel::Standard, passing),
            test("advanced", ConformanceLevel::Advanced, passing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Advanced)
            .await
            .unwrap();

        assert_eq!(result.level_achieved, Some(ConformanceLevel::Advanced));
        assert!(result.passed());
        assert_eq!(result.summary.passed, 3);
        assert_eq!(suite.state(), SuiteState::Completed);
    }

    #[tokio::test]
    async fn test_standard_failure_caps_at_basic() {
        let mut suite = suite_with(vec![
            test("basic", ConformanceLevel::Basic, passing),
            test("standard", ConformanceLevel::Standard, failing),
            test("advanced", ConformanceLevel::Advanced, passing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Advanced)
            .await
            .unwrap();

        assert_eq!(result.level_achieved, Some(ConformanceLevel::Basic));
        assert!(!result.passed());
        // Later tests still run after a failure.
        assert_eq!(result.results[2].status, TestStatus::Passed);
        assert_eq!(result.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_basic_failure_achieves_nothing() {
        let mut suite = suite_with(vec![
            test("basic", ConformanceLevel::Basic, failing),
            test("standard", ConformanceLevel::Standard, passing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Standard)
            .await
            .unwrap();

        assert_eq!(result.level_achieved, None);
    }

    #[tokio::test]
    async fn test_tests_above_level_are_skipped() {
        let mut suite = suite_with(vec![
            test("basic", ConformanceLevel::Basic, passing),
            test("standard", ConformanceLevel::Standard, failing),
            test("advanced", ConformanceLevel::Advanced, failing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Basic)
            .await
            .unwrap();

        assert_eq!(result.level_achieved, Some(ConformanceLevel::Basic));
        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.passed, 1);
        assert_eq!(result.summary.skipped, 2);
        assert_eq!(result.summary.failed, 0);
        let counts = result.categories[&TestCategory::RpcCorrectness];
        assert_eq!(counts.skipped, 2);
    }
}

mod isolation_tests {
    use super::*;

    #[tokio::test]
    async fn test_panicking_check_is_a_failure() {
        let mut suite = suite_with(vec![
            test("explodes", ConformanceLevel::Basic, panicking),
            test("after", ConformanceLevel::Basic, passing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Basic)
            .await
            .unwrap();

        assert_eq!(result.results[0].status, TestStatus::Failed);
        assert!(result.results[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("panicked"));
        assert_eq!(result.results[1].status, TestStatus::Passed);
        assert_eq!(result.level_achieved, None);
    }

    #[tokio::test]
    async fn test_hanging_check_times_out() {
        let mut suite = suite_with(vec![
            test("hangs", ConformanceLevel::Basic, hanging),
            test("after", ConformanceLevel::Basic, passing),
        ]);

        let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Basic)
            .await
            .unwrap();

        assert_eq!(result.results[0].status, TestStatus::Failed);
        assert!(result.results[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("timed out"));
        assert!(result.results[0].duration_ms < 5_000.0);
        assert_eq!(result.results[1].status, TestStatus::Passed);
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn test_duplicate_name_rejected() {
        let mut suite = ConformanceSuite::new();
        suite
            .register(test("once", ConformanceLevel::Basic, passing))
            .unwrap();
        let err = suite
            .register(test("once", ConformanceLevel::Standard, passing))
            .unwrap_err();
        assert!(matches!(err, ConformanceError::DuplicateTest(name) if name == "once"));
        assert_eq!(suite.tests().len(), 1);
        assert_eq!(suite.state(), SuiteState::Registered);
    }

    #[test]
    fn test_tests_for_level() {
        let suite = suite_with(vec![
            test("basic", ConformanceLevel::Basic, passing),
            test("advanced", ConformanceLevel::Advanced, passing),
        ]);
        assert_eq!(suite.tests_for(ConformanceLevel::Basic).count(), 1);
        assert_eq!(suite.tests_for(ConformanceLevel::Advanced).count(), 2);
    }

    #[tokio::test]
    async fn test_run_requires_serving_harness() {
        let mut suite = suite_with(vec![test("basic", ConformanceLevel::Basic, passing)]);
        let harness = TestHarness::new(MockPlugin::new());

        let err = suite
            .run(&harness, ConformanceLevel::Basic)
            .await
            .unwrap_err();
        assert!(matches!(err, ConformanceError::HarnessSetup(_)));
    }

    #[tokio::test]
    async fn test_suite_is_reusable() {
        let mut suite = suite_with(vec![test("basic", ConformanceLevel::Basic, passing)]);
        let harness = TestHarness::new(MockPlugin::new());
        harness.start().await.unwrap();

        let first = suite.run(&harness, ConformanceLevel::Basic).await.unwrap();
        let second = suite.run(&harness, ConformanceLevel::Basic).await.unwrap();
        assert_eq!(first.summary, second.summary);
        harness.stop();
    }
}
