//! Path resolution for the tidemark data directory

use std::path::PathBuf;

/// Environment variable that overrides the data directory
pub const HOME_ENV: &str = "TIDEMARK_HOME";

/// Resolves standard paths under the data directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// Resolve the data directory from `$TIDEMARK_HOME`, else `~/.tidemark`
    pub fn new() -> std::io::Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(home));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;
        Ok(Self::at(home.join(".tidemark")))
    }

    /// Use an explicit data directory
    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// SQLite store
    pub fn db_file(&self) -> PathBuf {
        self.home.join("tidemark.db")
    }

    /// User configuration overrides
    pub fn config_file(&self) -> PathBuf {
        self.home.join("tidemark.json")
    }

    /// Append-only log of shrink executions
    pub fn shrink_log(&self) -> PathBuf {
        self.home.join("shrink_log.jsonl")
    }
}
