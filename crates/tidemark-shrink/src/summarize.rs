//! Folding a group of observations into one summary observation

use chrono::DateTime;
use std::collections::HashSet;
use tidemark_core::{ConceptTag, NewObservation, Observation, ObservationType};

/// Category given to synthesized summaries
pub const SUMMARY_TYPE: &str = "summary";

const MAX_FACTS: usize = 20;
const KEY_FACT_MIN_WEIGHT: f64 = 0.8;

/// First `max_sentences` sentences of `content`, with an ellipsis when cut short
pub fn first_sentences(content: &str, max_sentences: usize) -> String {
    let all: Vec<&str> = content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let kept = &all[..all.len().min(max_sentences)];
    let mut out = kept.join(". ");
    if all.len() > kept.len() {
        out.push_str("...");
    }
    out
}

/// Build the replacement for `group`, which must be non-empty and single-project.
///
/// The narrative lists every original; facts survive only from high-weight
/// categories; concept tags are unioned, strongest first. The summary takes
/// the newest original's timestamp.
pub fn build_summary(group: &[&Observation]) -> Option<NewObservation> {
    let first = group.first()?;
    let count = group.len();

    let narrative = group
        .iter()
        .map(|obs| {
            let gist = obs
                .narrative
                .as_deref()
                .map(|n| first_sentences(n, 1))
                .filter(|g| !g.is_empty());
            match gist {
                Some(gist) => format!(
                    "- [{}] #{} {}: {}",
                    obs.obs_type,
                    obs.id,
                    obs.display_title(),
                    gist
                ),
                None => format!("- [{}] #{} {}", obs.obs_type, obs.id, obs.display_title()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut seen_facts = HashSet::new();
    let facts: Vec<String> = group
        .iter()
        .filter(|obs| obs.obs_type.weight() >= KEY_FACT_MIN_WEIGHT)
        .flat_map(|obs| obs.facts_list().unwrap_or_default())
        .filter(|fact| seen_facts.insert(fact.clone()))
        .take(MAX_FACTS)
        .collect();

    let mut seen_tags = HashSet::new();
    let mut concepts: Vec<String> = group
        .iter()
        .flat_map(|obs| obs.concept_names().unwrap_or_default())
        .filter(|tag| seen_tags.insert(tag.clone()))
        .collect();
    concepts.sort_by(|a, b| {
        ConceptTag::parse(b)
            .weight()
            .total_cmp(&ConceptTag::parse(a).weight())
    });

    let oldest = group.iter().map(|o| o.created_at_epoch).min().unwrap_or(0);
    let newest = group.iter().map(|o| o.created_at_epoch).max().unwrap_or(0);

    Some(NewObservation {
        project: first.project.clone(),
        obs_type: ObservationType::parse(SUMMARY_TYPE),
        title: Some(if count == 1 {
            "Summary of 1 observation".to_string()
        } else {
            format!("Summary of {} observations", count)
        }),
        subtitle: Some(format!("{} to {}", format_day(oldest), format_day(newest))),
        narrative: Some(narrative),
        facts,
        concepts,
        discovery_tokens: group.iter().map(|o| o.discovery_tokens).sum(),
        created_at_epoch: newest,
    })
}

fn format_day(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
