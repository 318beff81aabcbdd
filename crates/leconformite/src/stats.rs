// Latency Statistics
//
// Interpolating percentiles and variance against a baseline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Percentile `p` (clamped to `0..=100`) of `samples`.
///
/// Sorts a copy and interpolates linearly between the two nearest ranks at
/// index `p / 100 * (n - 1)`. An empty set yields zero.
pub fn percentile(samples: &[Duration], p: f64) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    percentile_sorted(&sorted, p)
}

fn percentile_sorted(sorted: &[Duration], p: f64) -> Duration {
    let Some(last) = sorted.len().checked_sub(1) else {
        return Duration::ZERO;
    };
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let rank = p / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    let low = sorted[lower];
    let high = sorted[upper];
    let span = high.saturating_sub(low).as_nanos() as f64;
    let offset = Duration::from_nanos((span * fraction).round() as u64);
    // Rounding must never step outside the bracketing ranks.
    (low + offset).min(high)
}

/// `|measured - baseline| / baseline`; infinite for a zero baseline unless
/// the measurement is also zero
pub fn variance_ratio(measured: Duration, baseline: Duration) -> f64 {
    let baseline = baseline.as_secs_f64();
    let measured = measured.as_secs_f64();
    if baseline == 0.0 {
        return if measured == 0.0 { 0.0 } else { f64::INFINITY };
    }
    (measured - baseline).abs() / baseline
}

/// Whether `measured` is within `threshold` of `baseline`.
///
/// Only regressions count: a measurement at or below the baseline is always
/// within variance.
pub fn within_variance(measured: Duration, baseline: Duration, threshold: f64) -> bool {
    measured <= baseline || variance_ratio(measured, baseline) <= threshold
}

/// Summary of one latency sample set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Sample count
    pub count: usize,
    /// Fastest sample
    pub min: Duration,
    /// Slowest sample
    pub max: Duration,
    /// Arithmetic mean
    pub mean: Duration,
    /// Median
    pub p50: Duration,
    /// 95th percentile
    pub p95: Duration,
    /// 99th percentile
    pub p99: Duration,
}

impl LatencyStats {
    /// Compute from raw samples; all zero when empty
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let total: Duration = sorted.iter().sum();

        Self {
            count: sorted.len(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: total / sorted.len() as u32,
            p50: percentile_sorted(&sorted, 50.0),
            p95: percentile_sorted(&sorted, 95.0),
            p99: percentile_sorted(&sorted, 99.0),
        }
    }

    /// One-line rendering in milliseconds
    pub fn describe(&self) -> String {
        format!(
            "n={} min={:.2}ms p50={:.2}ms p95={:.2}ms p99={:.2}ms max={:.2}ms",
            self.count,
            ms(self.min),
            ms(self.p50),
            ms(self.p95),
            ms(self.p99),
            ms(self.max)
        )
    }
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[rstest]
    #[case(0.0, 10)]
    #[case(50.0, 30)]
    #[case(100.0, 50)]
    #[case(25.0, 20)]
    fn test_percentile_exact_ranks(#[case] p: f64, #[case] expected_ms: u64) {
        let samples = millis(&[50, 10, 40, 20, 30]);
        assert_eq!(percentile(&samples, p), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_percentile_interpolates() {
        let samples = millis(&[10, 20]);
        let p = percentile(&samples, 50.0);
        assert!((p.as_secs_f64() - 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(percentile(&[], 99.0), Duration::ZERO);
        assert_eq!(percentile(&millis(&[7]), 95.0), Duration::from_millis(7));
        assert_eq!(LatencyStats::from_samples(&[]).count, 0);
    }

    #[test]
    fn test_variance() {
        let baseline = Duration::from_millis(100);
        assert!((variance_ratio(Duration::from_millis(110), baseline) - 0.1).abs() < 1e-9);
        assert!(within_variance(Duration::from_millis(105), baseline, 0.10));
        assert!(!within_variance(Duration::from_millis(150), baseline, 0.10));
        assert!(within_variance(Duration::from_millis(1), baseline, 0.10));
        assert_eq!(variance_ratio(Duration::ZERO, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_stats_bundle() {
        let stats = LatencyStats::from_samples(&millis(&[4, 1, 3, 2]));
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, Duration::from_millis(1));
        assert_eq!(stats.max, Duration::from_millis(4));
        assert_eq!(stats.mean, Duration::from_micros(2500));
        assert!(stats.describe().starts_with("n=4"));
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(values in prop::collection::vec(0u64..1_000_000, 1..200)) {
            let samples: Vec<Duration> = values.iter().map(|&v| Duration::from_micros(v)).collect();
            let p50 = percentile(&samples, 50.0);
            let p95 = percentile(&samples, 95.0);
            let p99 = percentile(&samples, 99.0);
            prop_assert!(p50 <= p95);
            prop_assert!(p95 <= p99);
            prop_assert!(p99 <= *samples.iter().max().unwrap());
        }
    }
}
