// Conformance Configuration
//
// *La Configuration* (The Configuration) - Suite, concurrency, performance,
// mock, and output settings, loaded from TOML with environment overrides.

use crate::error::{ConformanceError, Result as ConformanceResult};
use crate::level::ConformanceLevel;
use crate::reporter::ReportFormat;
use anyhow::{Context, Result};
use lecout::RpcMethod;
use lepasserelle::{HarnessConfig, StatusCode};
use lesimulacre::{MockConfig, SummaryScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "leconform.toml";

/// Environment variable overriding the requested level
pub const ENV_LEVEL: &str = "LECONFORM_LEVEL";
/// Environment variable overriding the report format
pub const ENV_FORMAT: &str = "LECONFORM_FORMAT";
/// Environment variable overriding the per-call timeout
pub const ENV_TIMEOUT_MS: &str = "LECONFORM_TIMEOUT_MS";

/// Full conformance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformanceConfig {
    /// Level and timeouts
    pub suite: SuiteConfig,
    /// Parallel call settings
    pub concurrency: ConcurrencyConfig,
    /// Latency sampling settings
    pub performance: PerformanceConfig,
    /// Mock plugin behaviour for `leconform run`
    pub mock: MockSection,
    /// Report rendering
    pub output: OutputConfig,
}

/// Suite settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Requested level
    pub level: ConformanceLevel,
    /// Upper bound on one check, including all of its calls
    pub test_timeout_ms: u64,
    /// Upper bound on one RPC call
    pub call_timeout_ms: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            level: ConformanceLevel::Basic,
            test_timeout_ms: 30_000,
            call_timeout_ms: 5_000,
        }
    }
}

/// Concurrency settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Parallel calls at the standard level
    pub standard_parallelism: usize,
    /// Parallel calls at the advanced level
    pub advanced_parallelism: usize,
    /// Ceiling on each individual call's latency
    pub latency_ceiling_ms: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            standard_parallelism: 10,
            advanced_parallelism: 50,
            latency_ceiling_ms: 1_000,
        }
    }
}

/// Performance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Calls sampled per method
    pub samples: usize,
    /// Allowed regression ratio over the advanced baseline
    pub variance_threshold: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            samples: 20,
            variance_threshold: 0.10,
        }
    }
}

/// Mock plugin settings, by method name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockSection {
    /// Plugin name
    pub name: String,
    /// Methods that fail
    pub errors: Vec<String>,
    /// Status code for failing methods
    pub error_code: String,
    /// Methods answering `UNIMPLEMENTED`
    pub unimplemented: Vec<String>,
    /// Synthetic recommendation count
    pub recommendation_count: usize,
    /// Summary over the page or the whole query
    pub summary_scope: SummaryScope,
    /// Per-method delay in milliseconds
    pub delays_ms: BTreeMap<String, u64>,
}

impl Default for MockSection {
    fn default() -> Self {
        Self {
            name: lesimulacre::config::DEFAULT_PLUGIN_NAME.to_string(),
            errors: Vec::new(),
            error_code: StatusCode::Unavailable.as_str().to_string(),
            unimplemented: Vec::new(),
            recommendation_count: lesimulacre::config::DEFAULT_RECOMMENDATION_COUNT,
            summary_scope: SummaryScope::Page,
            delays_ms: BTreeMap::new(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format
    pub format: ReportFormat,
}

impl ConformanceConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save configuration as TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let toml_string =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Apply `LECONFORM_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; unparsable values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LEVEL) {
            match level.parse() {
                Ok(level) => self.suite.level = level,
                Err(e) => warn!("Ignoring {}: {}", ENV_LEVEL, e),
            }
        }

        if let Some(format) = lookup(ENV_FORMAT) {
            match format.parse() {
                Ok(format) => self.output.format = format,
                Err(e) => warn!("Ignoring {}: {}", ENV_FORMAT, e),
            }
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            match timeout.parse::<u64>() {
                Ok(ms) => self.suite.call_timeout_ms = ms,
                Err(e) => warn!("Ignoring {}: {}", ENV_TIMEOUT_MS, e),
            }
        }
    }

    /// Reject values the suite cannot run with
    pub fn validate(&self) -> ConformanceResult<()> {
        if self.suite.call_timeout_ms == 0 {
            return Err(ConformanceError::invalid_config(
                "suite.call_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.suite.test_timeout_ms < self.suite.call_timeout_ms {
            return Err(ConformanceError::invalid_config(
                "suite.test_timeout_ms",
                "must be at least suite.call_timeout_ms",
            ));
        }
        if self.concurrency.standard_parallelism == 0 {
            return Err(ConformanceError::invalid_config(
                "concurrency.standard_parallelism",
                "must be at least 1",
            ));
        }
        if self.concurrency.advanced_parallelism < self.concurrency.standard_parallelism {
            return Err(ConformanceError::invalid_config(
                "concurrency.advanced_parallelism",
                "must be at least concurrency.standard_parallelism",
            ));
        }
        if self.performance.samples == 0 {
            return Err(ConformanceError::invalid_config(
                "performance.samples",
                "must be at least 1",
            ));
        }
        if !(self.performance.variance_threshold.is_finite()
            && self.performance.variance_threshold >= 0.0)
        {
            return Err(ConformanceError::invalid_config(
                "performance.variance_threshold",
                "must be a non-negative number",
            ));
        }
        self.mock_config().map(|_| ())
    }

    /// Parallel calls for `level`
    pub fn parallelism(&self, level: ConformanceLevel) -> usize {
        match level {
            ConformanceLevel::Advanced => self.concurrency.advanced_parallelism,
            ConformanceLevel::Basic | ConformanceLevel::Standard => {
                self.concurrency.standard_parallelism
            }
        }
    }

    /// Per-call timeout
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.suite.call_timeout_ms)
    }

    /// Per-check timeout
    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.suite.test_timeout_ms)
    }

    /// Per-call latency ceiling under parallel load
    pub fn latency_ceiling(&self) -> Duration {
        Duration::from_millis(self.concurrency.latency_ceiling_ms)
    }

    /// Harness timeouts
    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            call_timeout: self.call_timeout(),
            probe_timeout: self.call_timeout(),
        }
    }

    /// Build the mock plugin configuration from the `mock` section
    pub fn mock_config(&self) -> ConformanceResult<MockConfig> {
        let mock = &self.mock;
        let error_code = StatusCode::parse(&mock.error_code).ok_or_else(|| {
            ConformanceError::invalid_config(
                "mock.error_code",
                format!("unknown status code '{}'", mock.error_code),
            )
        })?;

        let mut config = MockConfig::new()
            .with_name(mock.name.clone())
            .with_error_code(error_code)
            .with_recommendation_count(mock.recommendation_count)
            .with_summary_scope(mock.summary_scope);

        for name in &mock.errors {
            config = config.with_error(parse_method("mock.errors", name)?);
        }
        for name in &mock.unimplemented {
            config = config.without(parse_method("mock.unimplemented", name)?);
        }
        for (name, ms) in &mock.delays_ms {
            config = config.with_delay(
                parse_method("mock.delays_ms", name)?,
                Duration::from_millis(*ms),
            );
        }

        Ok(config)
    }
}

fn parse_method(field: &str, name: &str) -> ConformanceResult<RpcMethod> {
    RpcMethod::parse(name).ok_or_else(|| {
        ConformanceError::invalid_config(field, format!("unknown RPC method '{name}'"))
    })
}
