//! SQLite-backed record store for observations, sessions and prompts

mod fts;
mod storage;

pub use fts::fts_query;
pub use storage::{SqliteStore, StoreCounts};
