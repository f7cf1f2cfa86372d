use super::Workspace;
use serde::Deserialize;
use std::path::Path;
use tidemark_core::{NewObservation, NewPrompt, NewSession, ObservationStore};
use tracing::warn;

/// One line of a seed file
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SeedRecord {
    Observation(NewObservation),
    Session(NewSession),
    Prompt(NewPrompt),
}

#[derive(Debug, Default, PartialEq)]
struct IngestCounts {
    observations: usize,
    sessions: usize,
    prompts: usize,
    skipped: usize,
}

fn ingest_file(ws: &Workspace, path: &Path) -> anyhow::Result<IngestCounts> {
    let content = std::fs::read_to_string(path)?;
    let mut counts = IngestCounts::default();

    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = match serde_json::from_str::<SeedRecord>(line) {
            Ok(r) => r,
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping malformed record");
                counts.skipped += 1;
                continue;
            }
        };
        match record {
            SeedRecord::Observation(obs) => {
                ws.store.insert_observation(&obs)?;
                counts.observations += 1;
            }
            SeedRecord::Session(session) => {
                ws.store.insert_session(&session)?;
                counts.sessions += 1;
            }
            SeedRecord::Prompt(prompt) => {
                ws.store.insert_prompt(&prompt)?;
                counts.prompts += 1;
            }
        }
    }
    Ok(counts)
}

/// One-line totals for the whole store after an ingest
fn store_totals(ws: &Workspace) -> anyhow::Result<String> {
    let counts = ws.store.counts(None)?;
    let projects = ws.store.projects()?;
    Ok(format!(
        "Store now holds {} observations, {} sessions, {} prompts across {} project(s): {}",
        counts.observations,
        counts.sessions,
        counts.prompts,
        projects.len(),
        projects.join(", ")
    ))
}

pub fn run(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("file not found: {}", file);
    }

    let ws = Workspace::open()?;
    let counts = ingest_file(&ws, path)?;

    println!("Ingested {}", file);
    println!("  Observations: {}", counts.observations);
    println!("  Sessions:     {}", counts.sessions);
    println!("  Prompts:      {}", counts.prompts);
    if counts.skipped > 0 {
        println!("  Skipped:      {} malformed lines", counts.skipped);
    }
    println!("{}", store_totals(&ws)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tidemark_telemetry::Paths;

    #[test]
    fn test_ingest_tagged_records() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::open_at(Paths::at(temp.path())).unwrap();
        let seed = temp.path().join("seed.jsonl");
        std::fs::write(
            &seed,
            [
                r#"{"kind":"session","project":"api","request":"add retries","created_at_epoch":100}"#,
                r#"{"kind":"prompt","project":"api","prompt_text":"why retry?","created_at_epoch":110}"#,
                r#"{"kind":"observation","project":"api","type":"bugfix","title":"Retry leak","facts":["pool=10"],"created_at_epoch":120}"#,
                "",
                r#"{"kind":"observation","project":"api"}"#,
                "not json",
            ]
            .join("\n"),
        )
        .unwrap();

        let counts = ingest_file(&ws, &seed).unwrap();
        assert_eq!(
            counts,
            IngestCounts {
                observations: 1,
                sessions: 1,
                prompts: 1,
                skipped: 2,
            }
        );

        assert_eq!(
            store_totals(&ws).unwrap(),
            "Store now holds 1 observations, 1 sessions, 1 prompts across 1 project(s): api"
        );
    }
}
