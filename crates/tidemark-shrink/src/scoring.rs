//! Importance scoring for a single observation

use tidemark_core::{Observation, MS_PER_DAY};

const BASE_SCORE: f64 = 0.5;
const NEUTRAL_WEIGHT: f64 = 0.5;
const TYPE_FACTOR: f64 = 0.3;
const CONCEPT_FACTOR: f64 = 0.2;
const CONTENT_FACTOR: f64 = 0.1;
const NARRATIVE_SATURATION: f64 = 500.0;
const FACTS_SATURATION: f64 = 5.0;

/// Score how worth keeping an observation is, in `[0, 1]`.
///
/// Category weight nudges the 0.5 baseline, then age dampens it by up to half
/// (observations at or past `max_age_ms` keep half). Concept tags and content
/// density add small bonuses afterwards. Tags or facts that fail to decode
/// simply contribute nothing.
pub fn importance_score(obs: &Observation, now_ms: i64, max_age_ms: i64) -> f64 {
    let mut score = BASE_SCORE;

    score += (obs.obs_type.weight() - NEUTRAL_WEIGHT) * TYPE_FACTOR;

    score *= 0.5 + age_decay(obs, now_ms, max_age_ms) * 0.5;

    if let Some(max_weight) = obs
        .concept_tags()
        .and_then(|tags| tags.iter().map(|t| t.weight()).reduce(f64::max))
    {
        score += (max_weight - NEUTRAL_WEIGHT) * CONCEPT_FACTOR;
    }

    let facts = obs.facts_list().map_or(0, |f| f.len());
    let content = ((obs.narrative_len() as f64 / NARRATIVE_SATURATION
        + facts as f64 / FACTS_SATURATION)
        / 2.0)
        .min(1.0);
    score += content * CONTENT_FACTOR;

    score.clamp(0.0, 1.0)
}

/// 1 for brand new, falling linearly to 0 at `max_age_ms`.
/// Timestamps in the future count as brand new.
fn age_decay(obs: &Observation, now_ms: i64, max_age_ms: i64) -> f64 {
    if max_age_ms <= 0 {
        return 0.0;
    }
    let age_ms = now_ms.saturating_sub(obs.created_at_epoch);
    (1.0 - age_ms as f64 / max_age_ms as f64).clamp(0.0, 1.0)
}

/// Whole days elapsed since the observation was created
pub fn age_days(obs: &Observation, now_ms: i64) -> i64 {
    now_ms.saturating_sub(obs.created_at_epoch).max(0) / MS_PER_DAY
}
