//! Domain types, configuration and store seams for the tidemark memory engine

mod config;
mod error;
mod store;
mod types;

pub use config::{Config, RetrievalConfig, ShrinkConfig, MS_PER_DAY};
pub use error::{Error, Result};
pub use store::{Direction, ObservationStore, RetrievalStore, SearchFilter};
pub use types::{
    ConceptTag, IndexRow, NewObservation, NewPrompt, NewSession, Observation, ObservationType,
    OrderBy, ProjectScope, PromptRecord, RecordKind, SearchType, SessionRecord, ShrinkAnalysis,
    ShrinkCandidate, ShrinkMode, ShrinkOutcome, TimelineItem, TimelineKey,
};
