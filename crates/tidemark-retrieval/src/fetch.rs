//! Batch fetch of full observations by id

use std::collections::HashSet;
use tidemark_core::{Error, Observation, ObservationStore, OrderBy, Result};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub ids: Vec<i64>,
    pub order: OrderBy,
    pub limit: Option<usize>,
    pub project: Option<String>,
}

impl FetchRequest {
    pub fn new(ids: Vec<i64>) -> Self {
        Self {
            ids,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ids.is_empty() {
            return Err(Error::invalid("ids", "must name at least one observation"));
        }
        if self.order == OrderBy::Relevance {
            return Err(Error::invalid("orderBy", "expected date_desc or date_asc"));
        }
        if self.limit == Some(0) {
            return Err(Error::invalid("limit", "must be at least 1"));
        }
        Ok(())
    }
}

/// Full records for the requested ids that exist, in one store round trip.
///
/// Unknown ids are left out silently. Repeated ids are fetched once.
pub fn get_observations<S: ObservationStore + ?Sized>(
    store: &S,
    request: &FetchRequest,
) -> Result<Vec<Observation>> {
    request.validate()?;

    let mut seen = HashSet::new();
    let ids: Vec<i64> = request
        .ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let project = request.project.as_deref().filter(|p| !p.trim().is_empty());
    let observations = store.observations_by_ids(&ids, request.order, request.limit, project)?;

    debug!(
        requested = ids.len(),
        found = observations.len(),
        "fetched observations"
    );
    Ok(observations)
}
