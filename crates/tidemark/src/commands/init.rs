use super::Workspace;
use tidemark_core::Config;
use tidemark_telemetry::{atomic_write, Paths};

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let created_config = init_at(&paths)?;

    println!("✓ Data directory: {}", paths.home.display());
    println!("  Database: {}", paths.db_file().display());
    if created_config {
        println!("  Wrote default config: {}", paths.config_file().display());
    } else {
        println!("  Keeping existing config: {}", paths.config_file().display());
    }
    Ok(())
}

/// Create the store and write a default config unless one exists.
/// Returns whether the config was written.
fn init_at(paths: &Paths) -> anyhow::Result<bool> {
    std::fs::create_dir_all(&paths.home)?;
    Workspace::open_at(paths.clone())?;

    let config_path = paths.config_file();
    if config_path.exists() {
        return Ok(false);
    }
    let json = serde_json::to_string_pretty(&Config::new())?;
    atomic_write(&config_path, json.as_bytes())?;
    Ok(true)
}
