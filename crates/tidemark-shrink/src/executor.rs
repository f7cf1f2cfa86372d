//! Applying a reviewed shrink selection to the store

use crate::summarize::build_summary;
use std::collections::{HashMap, HashSet};
use tidemark_core::{
    Error, Observation, ObservationStore, OrderBy, Result, ShrinkMode, ShrinkOutcome,
};
use tracing::{info, warn};

/// Remove or summarize the given observations, one independent mutation each.
///
/// The selection may be stale by the time it arrives: ids that no longer
/// exist, repeated ids and per-item store errors are all counted as failures
/// and never abort the batch. Only an empty selection is an error.
pub fn execute<S: ObservationStore + ?Sized>(
    store: &S,
    ids: &[i64],
    mode: ShrinkMode,
) -> Result<ShrinkOutcome> {
    if ids.is_empty() {
        return Err(Error::EmptySelection);
    }

    let outcome = match mode {
        ShrinkMode::Delete => delete_each(store, ids),
        ShrinkMode::Summarize => summarize_groups(store, ids),
    };

    info!(
        mode = mode.as_str(),
        requested = ids.len(),
        deleted = outcome.deleted,
        failed = outcome.failed,
        "shrink executed"
    );
    Ok(outcome)
}

fn delete_one<S: ObservationStore + ?Sized>(store: &S, id: i64) -> bool {
    match store.delete_observation(id) {
        Ok(true) => true,
        Ok(false) => {
            warn!(id, "observation no longer exists");
            false
        }
        Err(e) => {
            warn!(id, error = %e, "delete failed");
            false
        }
    }
}

fn delete_each<S: ObservationStore + ?Sized>(store: &S, ids: &[i64]) -> ShrinkOutcome {
    let mut outcome = ShrinkOutcome::default();
    for &id in ids {
        if delete_one(store, id) {
            outcome.deleted += 1;
        } else {
            outcome.failed += 1;
        }
    }
    outcome
}

fn summarize_groups<S: ObservationStore + ?Sized>(store: &S, ids: &[i64]) -> ShrinkOutcome {
    let mut outcome = ShrinkOutcome {
        summarized: Some(0),
        ..Default::default()
    };

    let found = match store.observations_by_ids(ids, OrderBy::DateAsc, None, None) {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "cannot load observations to summarize");
            outcome.failed = ids.len();
            return outcome;
        }
    };
    let by_id: HashMap<i64, Observation> = found.into_iter().map(|o| (o.id, o)).collect();

    // Group per project in first-seen order; repeats and missing ids fail
    let mut seen = HashSet::new();
    let mut groups: Vec<(String, Vec<&Observation>)> = Vec::new();
    for id in ids {
        let Some(obs) = by_id.get(id).filter(|_| seen.insert(*id)) else {
            warn!(id, "observation missing or repeated in selection");
            outcome.failed += 1;
            continue;
        };
        match groups.iter_mut().find(|(project, _)| *project == obs.project) {
            Some((_, members)) => members.push(obs),
            None => groups.push((obs.project.clone(), vec![obs])),
        }
    }

    let mut summarized = 0;
    for (project, members) in groups {
        let Some(summary) = build_summary(&members) else {
            continue;
        };
        let summary_id = match store.insert_observation(&summary) {
            Ok(id) => id,
            Err(e) => {
                warn!(%project, error = %e, "cannot write summary, originals kept");
                outcome.failed += members.len();
                continue;
            }
        };
        info!(%project, summary_id, originals = members.len(), "summary written");

        for obs in members {
            if delete_one(store, obs.id) {
                outcome.deleted += 1;
                summarized += 1;
            } else {
                outcome.failed += 1;
            }
        }
    }

    outcome.summarized = Some(summarized);
    outcome
}
