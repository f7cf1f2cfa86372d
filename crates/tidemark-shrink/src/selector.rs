//! Candidate selection for a shrink pass

use crate::scoring::{age_days, importance_score};
use crate::summarize::SUMMARY_TYPE;
use tidemark_core::{
    Error, Observation, ObservationStore, ObservationType, Result, ShrinkAnalysis,
    ShrinkCandidate, ShrinkConfig,
};
use tracing::{debug, info};

const OLD_AFTER_DAYS: i64 = 30;
const MINIMAL_NARRATIVE_CHARS: usize = 50;
const VERY_LOW_SCORE: f64 = 0.2;

/// Parameters of one analyze pass
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// `None` analyzes every project
    pub project: Option<String>,
    pub target_reduction: f64,
    pub min_age_ms: i64,
    pub max_age_ms: i64,
    pub min_score: f64,
}

impl AnalyzeOptions {
    pub fn from_config(config: &ShrinkConfig) -> Self {
        Self {
            project: None,
            target_reduction: config.target_reduction,
            min_age_ms: config.min_age_ms(),
            max_age_ms: config.max_age_ms(),
            min_score: config.min_score,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.project.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(Error::invalid("project", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.target_reduction) {
            return Err(Error::invalid(
                "targetReduction",
                format!("must be within [0, 1], got {}", self.target_reduction),
            ));
        }
        if self.min_age_ms < 0 {
            return Err(Error::invalid("minAge", "must not be negative"));
        }
        if self.max_age_ms < 0 {
            return Err(Error::invalid("maxAge", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(Error::invalid(
                "minScore",
                format!("must be within [0, 1], got {}", self.min_score),
            ));
        }
        Ok(())
    }
}

/// Quota of removals for a store of `total` observations: at least one
pub fn target_count(total: usize, target_reduction: f64) -> usize {
    ((total as f64 * target_reduction).floor() as usize).max(1)
}

/// Propose the least important old observations for removal.
///
/// Reads a point-in-time snapshot; nothing is mutated. The reduction target is
/// a fraction of every observation in scope, eligible or not. Summaries written
/// by an earlier pass are never proposed again.
pub fn analyze<S: ObservationStore + ?Sized>(
    store: &S,
    options: &AnalyzeOptions,
    now_ms: i64,
) -> Result<ShrinkAnalysis> {
    options.validate()?;
    let project = options.project.as_deref();

    let cutoff = now_ms.saturating_sub(options.min_age_ms);
    let eligible = store.observations_created_before(project, cutoff)?;
    let total_observations = store.count_observations(project)?;

    let mut candidates: Vec<ShrinkCandidate> = eligible
        .iter()
        .filter(|obs| obs.obs_type.as_str() != SUMMARY_TYPE)
        .filter_map(|obs| {
            let score = importance_score(obs, now_ms, options.max_age_ms);
            (score < options.min_score).then(|| candidate(obs, score, now_ms))
        })
        .collect();
    let below_threshold = candidates.len();

    // Stable: equal scores keep scan order
    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));
    candidates.truncate(target_count(total_observations, options.target_reduction));

    let total_tokens_saved = candidates.iter().map(|c| c.token_count).sum();

    debug!(
        eligible = eligible.len(),
        below_threshold, "scored shrink pool"
    );
    info!(
        project = project.unwrap_or("*"),
        total_observations,
        selected = candidates.len(),
        total_tokens_saved,
        "shrink analysis complete"
    );

    Ok(ShrinkAnalysis {
        observations_to_remove: candidates.len(),
        candidates,
        total_tokens_saved,
        total_observations,
    })
}

fn candidate(obs: &Observation, score: f64, now_ms: i64) -> ShrinkCandidate {
    ShrinkCandidate {
        id: obs.id,
        title: obs.title.clone(),
        obs_type: obs.obs_type.clone(),
        project: obs.project.clone(),
        created_at_epoch: obs.created_at_epoch,
        score,
        reasons: reasons(obs, score, now_ms),
        token_count: obs.token_estimate(),
    }
}

/// Human-readable explanations; may be empty for a below-threshold score
fn reasons(obs: &Observation, score: f64, now_ms: i64) -> Vec<String> {
    let mut reasons = Vec::new();

    let days = age_days(obs, now_ms);
    if days > OLD_AFTER_DAYS {
        reasons.push(format!("{} days old", days));
    }
    if obs.obs_type.weight() < ObservationType::LOW_PRIORITY_BELOW {
        reasons.push(format!("Low-priority type: {}", obs.obs_type));
    }
    if obs.narrative_len() < MINIMAL_NARRATIVE_CHARS {
        reasons.push("Minimal content".to_string());
    }
    if score < VERY_LOW_SCORE {
        reasons.push("Very low importance score".to_string());
    }

    reasons
}
