// Concurrency Checks
//
// Fan out parallel calls over one client and fan the outcomes back in. A
// conformant plugin serves every call, within the latency ceiling, with the
// same answer it gives sequentially.

use super::{digest, invoke, sample_resource};
use crate::level::{ConformanceLevel, TestCategory};
use crate::suite::{CheckContext, CheckOutcome, ConformanceSuiteTest};
use lecout::messages::{GetProjectedCostRequest, GetRecommendationsRequest};
use lecout::RpcMethod;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Methods every plugin serves, cycled through under load
const CORE_METHODS: [RpcMethod; 4] = [
    RpcMethod::Name,
    RpcMethod::Supports,
    RpcMethod::GetProjectedCost,
    RpcMethod::GetPricingSpec,
];

pub(super) fn tests() -> Vec<ConformanceSuiteTest> {
    vec![
        ConformanceSuiteTest::new(
            "parallel_calls",
            "Parallel core calls all succeed within the latency ceiling",
            TestCategory::Concurrency,
            ConformanceLevel::Standard,
            parallel_calls,
        ),
        ConformanceSuiteTest::new(
            "data_consistency",
            "Parallel calls return the same data as sequential calls",
            TestCategory::Concurrency,
            ConformanceLevel::Standard,
            data_consistency,
        ),
        ConformanceSuiteTest::new(
            "mixed_parallel_calls",
            "A larger parallel mix of every implemented method succeeds within the latency ceiling",
            TestCategory::Concurrency,
            ConformanceLevel::Advanced,
            mixed_parallel_calls,
        ),
    ]
}

async fn parallel_calls(ctx: CheckContext) -> CheckOutcome {
    let n = ctx.config.parallelism(ConformanceLevel::Standard);
    let ceiling = ctx.config.latency_ceiling();

    let succeeded = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(n);
    for i in 0..n {
        let client = ctx.client.clone();
        let succeeded = Arc::clone(&succeeded);
        let failed = Arc::clone(&failed);
        let tx = tx.clone();
        let method = CORE_METHODS[i % CORE_METHODS.len()];
        handles.push(tokio::spawn(async move {
            let started = Instant::now();
            let result = invoke(&client, method).await;
            let elapsed = started.elapsed();
            match result {
                Ok(()) => succeeded.fetch_add(1, Ordering::Relaxed),
                Err(status) => {
                    let _ = tx.send(format!("{method}: {status}"));
                    failed.fetch_add(1, Ordering::Relaxed)
                }
            };
            if elapsed > ceiling {
                let _ = tx.send(format!(
                    "{method} took {:.2}ms, ceiling is {}ms",
                    elapsed.as_secs_f64() * 1_000.0,
                    ceiling.as_millis()
                ));
            }
        }));
    }
    drop(tx);

    let mut problems = Vec::new();
    for handle in handles {
        if let Err(e) = handle.await {
            failed.fetch_add(1, Ordering::Relaxed);
            problems.push(format!("call task aborted: {e}"));
        }
    }
    while let Some(problem) = rx.recv().await {
        problems.push(problem);
    }

    let succeeded = succeeded.load(Ordering::Relaxed);
    let failed = failed.load(Ordering::Relaxed);
    if succeeded + failed != n {
        problems.push(format!("{n} calls issued, {} accounted for", succeeded + failed));
    }

    CheckOutcome::from_problems(problems)
        .with_detail(format!("{succeeded}/{n} parallel calls succeeded"))
}

async fn mixed_parallel_calls(ctx: CheckContext) -> CheckOutcome {
    let n = ctx.config.parallelism(ConformanceLevel::Advanced);
    let ceiling = ctx.config.latency_ceiling();
    let methods: Vec<RpcMethod> = ctx.capabilities.methods().collect();
    if methods.is_empty() {
        return CheckOutcome::fail("no methods available to call");
    }

    let mut set = JoinSet::new();
    for i in 0..n {
        let client = ctx.client.clone();
        let method = methods[i % methods.len()];
        set.spawn(async move {
            let started = Instant::now();
            let result = invoke(&client, method).await;
            (method, result, started.elapsed())
        });
    }

    let mut problems = Vec::new();
    let mut slowest = Duration::ZERO;
    let mut completed = 0;
    while let Some(joined) = set.join_next().await {
        let (method, result, elapsed) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                problems.push(format!("call task aborted: {e}"));
                continue;
            }
        };
        completed += 1;
        slowest = slowest.max(elapsed);
        if let Err(status) = result {
            problems.push(format!("{method}: {status}"));
        } else if elapsed > ceiling {
            problems.push(format!(
                "{method} took {:.2}ms, ceiling is {}ms",
                elapsed.as_secs_f64() * 1_000.0,
                ceiling.as_millis()
            ));
        }
    }

    CheckOutcome::from_problems(problems).with_detail(format!(
        "{completed}/{n} calls over {} methods, slowest {:.2}ms",
        methods.len(),
        slowest.as_secs_f64() * 1_000.0
    ))
}

async fn data_consistency(ctx: CheckContext) -> CheckOutcome {
    let n = ctx.config.parallelism(ConformanceLevel::Standard);
    let mut problems = Vec::new();
    let mut details = Vec::new();

    let projected = GetProjectedCostRequest {
        resource: Some(sample_resource()),
    };
    match compare(&ctx, n, projected, |client, req| async move {
        let resp = client.get_projected_cost(&req).await.map_err(|s| s.to_string())?;
        digest(&resp)
    })
    .await
    {
        Ok(()) => details.push(format!("GetProjectedCost consistent over {n} parallel calls")),
        Err(problem) => problems.push(format!("GetProjectedCost: {problem}")),
    }

    if ctx.capabilities.supports(RpcMethod::GetRecommendations) {
        let recommendations = GetRecommendationsRequest {
            page_size: 10,
            ..GetRecommendationsRequest::default()
        };
        match compare(&ctx, n, recommendations, |client, req| async move {
            let resp = client.get_recommendations(&req).await.map_err(|s| s.to_string())?;
            digest(&resp)
        })
        .await
        {
            Ok(()) => details.push(format!("GetRecommendations consistent over {n} parallel calls")),
            Err(problem) => problems.push(format!("GetRecommendations: {problem}")),
        }
    }

    let mut outcome = CheckOutcome::from_problems(problems);
    outcome.details.extend(details);
    outcome
}

/// Digest one sequential call, then `n` parallel calls, and require a single
/// distinct digest
async fn compare<Req, F, Fut>(ctx: &CheckContext, n: usize, request: Req, call: F) -> Result<(), String>
where
    Req: Clone + Send + 'static,
    F: Fn(lepasserelle::CostSourceClient, Req) -> Fut,
    Fut: std::future::Future<Output = Result<String, String>> + Send + 'static,
{
    let reference = call(ctx.client.clone(), request.clone()).await?;

    let mut set = JoinSet::new();
    for _ in 0..n {
        set.spawn(call(ctx.client.clone(), request.clone()));
    }

    let mut digests = BTreeSet::new();
    digests.insert(reference);
    while let Some(joined) = set.join_next().await {
        let digest = joined.map_err(|e| format!("call task aborted: {e}"))??;
        digests.insert(digest);
    }

    if digests.len() == 1 {
        Ok(())
    } else {
        Err(format!("{} distinct responses to one request", digests.len()))
    }
}
