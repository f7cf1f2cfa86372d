pub mod call;
pub mod get;
pub mod ingest;
pub mod init;
pub mod search;
pub mod shrink;
pub mod timeline;
pub mod version;

use tidemark_core::{Config, ObservationType, ProjectScope};
use tidemark_store::SqliteStore;
use tidemark_telemetry::Paths;

/// Data directory, configuration and open store for one command
pub struct Workspace {
    pub paths: Paths,
    pub config: Config,
    pub store: SqliteStore,
}

impl Workspace {
    pub fn open() -> anyhow::Result<Self> {
        Self::open_at(Paths::new()?)
    }

    pub fn open_at(paths: Paths) -> anyhow::Result<Self> {
        let config = Config::load(&paths.config_file());
        let store = SqliteStore::new(&paths.db_file())?;
        Ok(Self {
            paths,
            config,
            store,
        })
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Categories from a comma-separated list; blanks are skipped
pub fn obs_types<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<ObservationType> {
    names
        .into_iter()
        .flat_map(|n| n.split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ObservationType::parse)
        .collect()
}

/// `None` when neither a project nor global scope was asked for
pub fn scope(project: Option<&str>, all_projects: bool) -> Option<ProjectScope> {
    if all_projects {
        return Some(ProjectScope::All);
    }
    project.map(|p| ProjectScope::Project(p.to_string()))
}

pub fn format_epoch(epoch_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
