//! leconformite - CostSource conformance suite
//!
//! *La Conformité* (The Conformance) - A leveled suite of checks run against
//! a CostSource plugin through the harness. Checks are grouped into spec
//! validation, RPC correctness, performance, and concurrency; each carries
//! the lowest level (basic, standard, advanced) at which it runs.
//!
//! ```no_run
//! use leconformite::{checks, run_plugin, ConformanceConfig, ConformanceLevel};
//! use lesimulacre::MockPlugin;
//!
//! # async fn demo() -> leconformite::Result<()> {
//! let mut suite = checks::standard_suite(ConformanceConfig::default())?;
//! let result = run_plugin(&mut suite, MockPlugin::new(), ConformanceLevel::Standard).await?;
//! assert!(result.passed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Per-method latency ceilings
pub mod baseline;

/// Built-in check catalogue
pub mod checks;

/// `leconform` command-line front end
pub mod cli;

/// TOML configuration with environment overrides
pub mod config;

/// Run-aborting errors
pub mod error;

/// Conformance levels and test categories
pub mod level;

/// JSON and text reports
pub mod reporter;

/// Percentiles and variance
pub mod stats;

/// Test registry and runner
pub mod suite;

pub use config::ConformanceConfig;
pub use error::{ConformanceError, Result};
pub use level::{ConformanceLevel, TestCategory};
pub use reporter::{render, ReportFormat};
pub use stats::{percentile, within_variance, LatencyStats};
pub use suite::{
    level_achieved, run_plugin, CheckContext, CheckOutcome, ConformanceResult, ConformanceSuite,
    ConformanceSuiteTest, TestResult, TestStatus,
};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
