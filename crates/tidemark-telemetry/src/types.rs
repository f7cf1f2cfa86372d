//! Audit record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One shrink execution, appended to the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShrinkRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub requested: usize,
    pub deleted: usize,
    pub failed: usize,
    #[serde(default)]
    pub summarized: Option<usize>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub observation_ids: Vec<i64>,
}

impl ShrinkRecord {
    /// Fraction of requested ids that were not removed
    pub fn failure_ratio(&self) -> f64 {
        if self.requested == 0 {
            return 0.0;
        }
        self.failed as f64 / self.requested as f64
    }
}
