//! Engine configuration with file overrides

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Shrink engine defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkConfig {
    /// Fraction of in-scope observations to aim to remove
    pub target_reduction: f64,

    /// Observations younger than this are never candidates
    pub min_age_days: u64,

    /// Age at which the age dampener bottoms out
    pub max_age_days: u64,

    /// Scores below this make an observation a candidate
    pub min_score: f64,
}

impl ShrinkConfig {
    pub fn new() -> Self {
        Self {
            target_reduction: 0.3,
            min_age_days: 7,
            max_age_days: 180,
            min_score: 0.6,
        }
    }

    pub fn min_age_ms(&self) -> i64 {
        days_to_ms(self.min_age_days)
    }

    pub fn max_age_ms(&self) -> i64 {
        days_to_ms(self.max_age_days)
    }
}

impl Default for ShrinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn days_to_ms(days: u64) -> i64 {
    i64::try_from(days)
        .unwrap_or(i64::MAX)
        .saturating_mul(MS_PER_DAY)
}

/// Retrieval defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub search_limit: usize,
    pub depth_before: usize,
    pub depth_after: usize,
}

impl RetrievalConfig {
    pub fn new() -> Self {
        Self {
            search_limit: 20,
            depth_before: 5,
            depth_after: 5,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shrink: ShrinkConfig,
    pub retrieval: RetrievalConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from a JSON file. Missing or unreadable files yield defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
                return Self::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::new()
            }
        }
    }
}
