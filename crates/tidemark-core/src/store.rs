//! Store collaborator seams consumed by the engine

use crate::types::{
    NewObservation, Observation, ObservationType, OrderBy, PromptRecord, RecordKind,
    SessionRecord, TimelineItem, TimelineKey,
};
use anyhow::Result;

/// Primitives the shrink engine needs from the store
pub trait ObservationStore {
    /// Observations created strictly before `cutoff_epoch`, oldest first
    fn observations_created_before(
        &self,
        project: Option<&str>,
        cutoff_epoch: i64,
    ) -> Result<Vec<Observation>>;

    fn count_observations(&self, project: Option<&str>) -> Result<usize>;

    /// Existing observations among `ids`, ordered and capped as requested
    fn observations_by_ids(
        &self,
        ids: &[i64],
        order: OrderBy,
        limit: Option<usize>,
        project: Option<&str>,
    ) -> Result<Vec<Observation>>;

    /// Remove one observation; `Ok(false)` when no such id exists
    fn delete_observation(&self, id: i64) -> Result<bool>;

    fn insert_observation(&self, observation: &NewObservation) -> Result<i64>;
}

/// Filter for per-kind searches
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Free text; `None` lists by filter only
    pub query: Option<String>,
    pub project: Option<String>,
    /// Inclusive lower bound, epoch ms
    pub date_start: Option<i64>,
    /// Inclusive upper bound, epoch ms
    pub date_end: Option<i64>,
    /// Observation categories to keep; empty keeps all
    pub obs_types: Vec<ObservationType>,
    pub order: OrderBy,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// Query primitives the retrieval service needs on top of [`ObservationStore`]
pub trait RetrievalStore: ObservationStore {
    fn search_observations(&self, filter: &SearchFilter) -> Result<Vec<Observation>>;

    fn search_sessions(&self, filter: &SearchFilter) -> Result<Vec<SessionRecord>>;

    fn search_prompts(&self, filter: &SearchFilter) -> Result<Vec<PromptRecord>>;

    fn find_item(&self, kind: RecordKind, id: i64) -> Result<Option<TimelineItem>>;

    /// Up to `limit` items of the merged stream strictly before or after
    /// `pivot`, nearest to it, returned in chronological order
    fn neighbors(
        &self,
        project: &str,
        pivot: TimelineKey,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<TimelineItem>>;
}
