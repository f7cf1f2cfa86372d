//! In-memory store with failure injection for unit tests

use anyhow::{bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use tidemark_core::{
    NewObservation, Observation, ObservationStore, ObservationType, OrderBy, MS_PER_DAY,
};

/// Fixed clock for deterministic ages
pub const NOW: i64 = 1_800_000_000_000;

pub fn observation(
    id: i64,
    obs_type: ObservationType,
    age_in_days: i64,
    narrative: String,
) -> Observation {
    Observation {
        id,
        project: "api".to_string(),
        obs_type,
        title: Some(format!("observation {}", id)),
        subtitle: None,
        narrative: Some(narrative),
        facts: None,
        concepts: None,
        discovery_tokens: 0,
        created_at_epoch: NOW - age_in_days * MS_PER_DAY,
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub observations: RefCell<Vec<Observation>>,
    pub failing_deletes: HashSet<i64>,
    pub fail_reads: bool,
    pub fail_inserts: bool,
    pub next_id: Cell<i64>,
}

impl FakeStore {
    pub fn with(observations: Vec<Observation>) -> Self {
        let next = observations.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let store = Self {
            observations: RefCell::new(observations),
            ..Default::default()
        };
        store.next_id.set(next);
        store
    }

    pub fn ids(&self) -> Vec<i64> {
        self.observations.borrow().iter().map(|o| o.id).collect()
    }

    pub fn get(&self, id: i64) -> Option<Observation> {
        self.observations
            .borrow()
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }
}

impl ObservationStore for FakeStore {
    fn observations_created_before(
        &self,
        project: Option<&str>,
        cutoff_epoch: i64,
    ) -> Result<Vec<Observation>> {
        if self.fail_reads {
            bail!("store offline");
        }
        Ok(self
            .observations
            .borrow()
            .iter()
            .filter(|o| o.created_at_epoch < cutoff_epoch)
            .filter(|o| project.map_or(true, |p| o.project == p))
            .cloned()
            .collect())
    }

    fn count_observations(&self, project: Option<&str>) -> Result<usize> {
        if self.fail_reads {
            bail!("store offline");
        }
        Ok(self
            .observations
            .borrow()
            .iter()
            .filter(|o| project.map_or(true, |p| o.project == p))
            .count())
    }

    fn observations_by_ids(
        &self,
        ids: &[i64],
        order: OrderBy,
        limit: Option<usize>,
        project: Option<&str>,
    ) -> Result<Vec<Observation>> {
        if self.fail_reads {
            bail!("store offline");
        }
        let mut found: Vec<Observation> = self
            .observations
            .borrow()
            .iter()
            .filter(|o| ids.contains(&o.id))
            .filter(|o| project.map_or(true, |p| o.project == p))
            .cloned()
            .collect();
        found.sort_by_key(|o| (o.created_at_epoch, o.id));
        if order != OrderBy::DateAsc {
            found.reverse();
        }
        found.truncate(limit.unwrap_or(usize::MAX));
        Ok(found)
    }

    fn delete_observation(&self, id: i64) -> Result<bool> {
        if self.failing_deletes.contains(&id) {
            bail!("locked row {}", id);
        }
        let mut observations = self.observations.borrow_mut();
        let before = observations.len();
        observations.retain(|o| o.id != id);
        Ok(observations.len() < before)
    }

    fn insert_observation(&self, new: &NewObservation) -> Result<i64> {
        if self.fail_inserts {
            bail!("disk full");
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let encode = |items: &[String]| {
            (!items.is_empty()).then(|| serde_json::to_string(items).unwrap())
        };
        self.observations.borrow_mut().push(Observation {
            id,
            project: new.project.clone(),
            obs_type: new.obs_type.clone(),
            title: new.title.clone(),
            subtitle: new.subtitle.clone(),
            narrative: new.narrative.clone(),
            facts: encode(&new.facts),
            concepts: encode(&new.concepts),
            discovery_tokens: new.discovery_tokens,
            created_at_epoch: new.created_at_epoch,
        });
        Ok(id)
    }
}
