// Performance Checks
//
// Sequential latency sampling per method, compared against the baseline
// table. Unimplemented optional methods are not sampled.

use super::invoke;
use crate::baseline::{self, LatencyBaseline};
use crate::level::{ConformanceLevel, TestCategory};
use crate::stats::{variance_ratio, within_variance, LatencyStats};
use crate::suite::{CheckContext, CheckOutcome, ConformanceSuiteTest};
use lecout::RpcMethod;
use std::time::{Duration, Instant};

pub(super) fn tests() -> Vec<ConformanceSuiteTest> {
    use ConformanceLevel::{Advanced, Standard};
    use TestCategory::Performance;

    vec![
        ConformanceSuiteTest::new(
            "latency_baselines_standard",
            "p95 latency of every implemented method is within its standard ceiling",
            Performance,
            Standard,
            |ctx| check_ceilings(ctx, Standard),
        ),
        ConformanceSuiteTest::new(
            "latency_baselines_advanced",
            "p95 latency of every implemented method is within its advanced ceiling",
            Performance,
            Advanced,
            |ctx| check_ceilings(ctx, Advanced),
        ),
        ConformanceSuiteTest::new(
            "latency_variance",
            "p99 tail latency stays within the variance threshold of the advanced ceiling",
            Performance,
            Advanced,
            latency_variance,
        ),
    ]
}

/// Time `samples` sequential calls of `method`
async fn measure(ctx: &CheckContext, method: RpcMethod, samples: usize) -> Result<Vec<Duration>, String> {
    let mut latencies = Vec::with_capacity(samples);
    for _ in 0..samples {
        let started = Instant::now();
        invoke(&ctx.client, method)
            .await
            .map_err(|status| format!("{method} failed while sampling: {status}"))?;
        latencies.push(started.elapsed());
    }
    Ok(latencies)
}

/// Sample every implemented method, calling `judge` on each result set
async fn sample_all<F>(ctx: &CheckContext, mut judge: F) -> CheckOutcome
where
    F: FnMut(&LatencyBaseline, &LatencyStats) -> Option<String>,
{
    let samples = ctx.config.performance.samples.max(1);
    let mut problems = Vec::new();
    let mut details = Vec::new();

    for baseline in baseline::all() {
        if !ctx.capabilities.supports(baseline.method) {
            details.push(format!("{}: not implemented", baseline.method));
            continue;
        }
        match measure(ctx, baseline.method, samples).await {
            Ok(latencies) => {
                let stats = LatencyStats::from_samples(&latencies);
                details.push(format!("{}: {}", baseline.method, stats.describe()));
                if let Some(problem) = judge(baseline, &stats) {
                    problems.push(problem);
                }
            }
            Err(problem) => problems.push(problem),
        }
    }

    let mut outcome = CheckOutcome::from_problems(problems);
    outcome.details.extend(details);
    outcome
}

async fn check_ceilings(ctx: CheckContext, level: ConformanceLevel) -> CheckOutcome {
    sample_all(&ctx, |baseline, stats| {
        let ceiling = baseline.threshold(level);
        (stats.p95 > ceiling).then(|| {
            format!(
                "{} p95 {:.2}ms exceeds the {level} ceiling of {}ms",
                baseline.method,
                stats.p95.as_secs_f64() * 1_000.0,
                ceiling.as_millis()
            )
        })
    })
    .await
}

/// Tail check: a method whose p95 clears its ceiling can still stall on a
/// few calls, which only p99 sees.
async fn latency_variance(ctx: CheckContext) -> CheckOutcome {
    let threshold = ctx.config.performance.variance_threshold;
    sample_all(&ctx, |baseline, stats| {
        (!within_variance(stats.p99, baseline.advanced, threshold)).then(|| {
            format!(
                "{} p99 {:.2}ms is {:.0}% over the {}ms ceiling (limit {:.0}%)",
                baseline.method,
                stats.p99.as_secs_f64() * 1_000.0,
                variance_ratio(stats.p99, baseline.advanced) * 100.0,
                baseline.advanced.as_millis(),
                threshold * 100.0
            )
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_ceiling_levels_registered() {
        let tests = tests();
        assert_eq!(tests.len(), 3);
        assert!(tests.iter().all(|t| t.category == TestCategory::Performance));
        assert!(tests.iter().any(|t| t.min_level == ConformanceLevel::Standard));
        assert_eq!(
            tests
                .iter()
                .filter(|t| t.min_level == ConformanceLevel::Advanced)
                .count(),
            2
        );
    }
}
