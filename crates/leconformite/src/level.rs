// Levels and Categories
//
// *Le Niveau* (The Level) - The ordered bar a plugin is checked against, and
// the buckets checks are grouped into.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conformance level; `Basic < Standard < Advanced`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConformanceLevel {
    /// Required RPCs answer and validate input
    #[default]
    Basic,
    /// Adds extended RPCs, latency baselines, and moderate parallelism
    Standard,
    /// Adds strict latency, variance, and heavy parallelism
    Advanced,
}

impl ConformanceLevel {
    /// Every level, lowest first
    pub const ALL: [Self; 3] = [Self::Basic, Self::Standard, Self::Advanced];

    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConformanceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown conformance level '{s}' (expected basic, standard, or advanced)"))
    }
}

/// What a check exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestCategory {
    /// Response shapes and field formats
    SpecValidation,
    /// Protocol behaviour: errors, pagination, scoping
    #[serde(rename = "RPCCorrectness")]
    RpcCorrectness,
    /// Latency against baselines
    Performance,
    /// Parallel calls against one plugin
    Concurrency,
}

impl TestCategory {
    /// Every category in report order
    pub const ALL: [Self; 4] = [
        Self::SpecValidation,
        Self::RpcCorrectness,
        Self::Performance,
        Self::Concurrency,
    ];

    /// Display name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpecValidation => "SpecValidation",
            Self::RpcCorrectness => "RPCCorrectness",
            Self::Performance => "Performance",
            Self::Concurrency => "Concurrency",
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
