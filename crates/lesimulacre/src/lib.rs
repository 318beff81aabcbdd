//! lesimulacre - Mock CostSource plugin
//!
//! *Le Simulacre* (The Mock) - A configurable reference implementation of the
//! CostSource service. It prices a fixed rate table, synthesises deterministic
//! cost, recommendation, and budget data, and can be told to fail, stall, or
//! drop optional methods so the harness's error paths can be exercised.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Immutable mock behaviour
pub mod config;

/// Mock plugin implementation
pub mod plugin;

/// Rate table and SKU scaling
pub mod rates;

/// Deterministic data synthesis
pub mod synth;

pub use config::{MockConfig, SummaryScope};
pub use plugin::MockPlugin;
