// Report Rendering
//
// *Le Rapporteur* (The Reporter) - Turns a `ConformanceResult` into a
// machine-readable JSON document or a human-readable text report.

use crate::error::Result;
use crate::suite::{ConformanceResult, TestStatus};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

/// Schema identifier carried by every JSON report
pub const SCHEMA_VERSION: &str = "costsource-conformance/v1";

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Pretty-printed JSON
    Json,
    /// Plain text for terminals
    #[default]
    Text,
}

impl ReportFormat {
    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown report format '{other}' (expected json or text)")),
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    schema_version: &'static str,
    #[serde(flatten)]
    result: &'a ConformanceResult,
}

/// Render `result` in `format`
pub fn render(result: &ConformanceResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => render_json(result),
        ReportFormat::Text => Ok(render_text(result)),
    }
}

fn render_json(result: &ConformanceResult) -> Result<String> {
    let report = JsonReport {
        schema_version: SCHEMA_VERSION,
        result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// `write!` into a String cannot fail; results are discarded below.
fn render_text(result: &ConformanceResult) -> String {
    let mut out = String::new();
    let rule = "=".repeat(64);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "CostSource conformance report: {}", result.plugin_name);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Requested level : {}", result.requested_level);
    let _ = writeln!(
        out,
        "Level achieved  : {}",
        result
            .level_achieved
            .map_or("none", |level| level.as_str())
    );
    let _ = writeln!(
        out,
        "Started         : {}",
        result.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Duration        : {:.1}ms", result.duration_ms);
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>6} {:>6} {:>7}",
        "Category", "Total", "Passed", "Failed", "Skipped"
    );
    let _ = writeln!(out, "{}", "-".repeat(45));
    for (category, counts) in &result.categories {
        let _ = writeln!(
            out,
            "{:<16} {:>6} {:>6} {:>6} {:>7}",
            category.as_str(),
            counts.total,
            counts.passed,
            counts.failed,
            counts.skipped
        );
    }
    let _ = writeln!(out, "{}", "-".repeat(45));
    let _ = writeln!(
        out,
        "{:<16} {:>6} {:>6} {:>6} {:>7}",
        "All",
        result.summary.total,
        result.summary.passed,
        result.summary.failed,
        result.summary.skipped
    );

    let failures: Vec<_> = result.failures().collect();
    if !failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failures:");
        for test in failures {
            let _ = writeln!(
                out,
                "  [{}] {} ({:.1}ms)",
                test.min_level, test.name, test.duration_ms
            );
            if let Some(error) = &test.error {
                let _ = writeln!(out, "      {error}");
            }
        }
    }

    let _ = writeln!(out);
    let verdict = if result.passed() { "PASS" } else { "FAIL" };
    let _ = writeln!(
        out,
        "{verdict}: {} passed, {} failed, {} skipped",
        result.summary.passed, result.summary.failed, result.summary.skipped
    );

    out
}

/// Counts of each status, for log lines
pub fn status_line(result: &ConformanceResult) -> String {
    let count = |status: TestStatus| result.results.iter().filter(|r| r.status == status).count();
    format!(
        "passed={} failed={} skipped={}",
        count(TestStatus::Passed),
        count(TestStatus::Failed),
        count(TestStatus::Skipped)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ConformanceLevel, TestCategory};
    use crate::suite::{CategorySummary, TestResult};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(failing: bool) -> ConformanceResult {
        let status = if failing { TestStatus::Failed } else { TestStatus::Passed };
        let results = vec![
            TestResult {
                name: "name_is_reported".to_string(),
                category: TestCategory::SpecValidation,
                min_level: ConformanceLevel::Basic,
                status,
                error: failing.then(|| "Name returned an empty name".to_string()),
                duration_ms: 1.5,
                details: Vec::new(),
            },
            TestResult {
                name: "mixed_parallel_calls".to_string(),
                category: TestCategory::Concurrency,
                min_level: ConformanceLevel::Advanced,
                status: TestStatus::Skipped,
                error: None,
                duration_ms: 0.0,
                details: Vec::new(),
            },
        ];
        let mut categories = BTreeMap::new();
        categories.insert(
            TestCategory::SpecValidation,
            CategorySummary {
                total: 1,
                passed: usize::from(!failing),
                failed: usize::from(failing),
                skipped: 0,
            },
        );
        categories.insert(
            TestCategory::Concurrency,
            CategorySummary {
                total: 1,
                passed: 0,
                failed: 0,
                skipped: 1,
            },
        );
        ConformanceResult {
            plugin_name: "mock-plugin".to_string(),
            requested_level: ConformanceLevel::Standard,
            level_achieved: (!failing).then_some(ConformanceLevel::Standard),
            summary: CategorySummary {
                total: 2,
                passed: usize::from(!failing),
                failed: usize::from(failing),
                skipped: 1,
            },
            categories,
            duration_ms: 12.0,
            started_at: Utc::now(),
            results,
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
        assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::default(), ReportFormat::Text);
    }

    #[test]
    fn test_json_carries_schema_version() {
        let json = render(&result(false), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["plugin_name"], "mock-plugin");
        assert_eq!(value["level_achieved"], "standard");
        assert_eq!(value["categories"]["Concurrency"]["skipped"], 1);
        assert_eq!(value["results"][1]["status"], "skipped");
    }

    #[test]
    fn test_text_lists_failures() {
        let text = render(&result(true), ReportFormat::Text).unwrap();
        assert!(text.contains("Level achieved  : none"));
        assert!(text.contains("name_is_reported"));
        assert!(text.contains("Name returned an empty name"));
        assert!(text.contains("FAIL: 0 passed, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_text_passing_run() {
        let text = render(&result(false), ReportFormat::Text).unwrap();
        assert!(!text.contains("Failures:"));
        assert!(text.contains("PASS"));
        assert_eq!(status_line(&result(false)), "passed=1 failed=0 skipped=1");
    }
}
