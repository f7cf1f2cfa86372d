use super::{format_epoch, now_ms, Workspace};
use crate::cli::AnalyzeArgs;
use std::collections::BTreeSet;
use tidemark_core::{
    ObservationStore, OrderBy, ShrinkAnalysis, ShrinkMode, ShrinkOutcome, MS_PER_DAY,
};
use tidemark_shrink::{analyze, execute, AnalyzeOptions};
use tidemark_telemetry::{append_jsonl, read_jsonl, ShrinkRecord};
use tracing::warn;

const HISTORY_LIMIT: usize = 20;

fn analyze_options(ws: &Workspace, args: &AnalyzeArgs) -> AnalyzeOptions {
    let defaults = AnalyzeOptions::from_config(&ws.config.shrink);
    let days = |d: i64| d.saturating_mul(MS_PER_DAY);
    AnalyzeOptions {
        project: args.project.clone(),
        target_reduction: args.target_reduction.unwrap_or(defaults.target_reduction),
        min_age_ms: args.min_age.map(days).unwrap_or(defaults.min_age_ms),
        max_age_ms: args.max_age.map(days).unwrap_or(defaults.max_age_ms),
        min_score: args.min_score.unwrap_or(defaults.min_score),
    }
}

fn render_analysis(analysis: &ShrinkAnalysis) -> String {
    let mut out = format!(
        "{} of {} observations proposed, ~{} tokens reclaimable",
        analysis.observations_to_remove, analysis.total_observations, analysis.total_tokens_saved
    );
    for c in &analysis.candidates {
        out.push_str(&format!(
            "\n  #{:<6} {:.3}  {}  [{}] {}",
            c.id,
            c.score,
            format_epoch(c.created_at_epoch),
            c.obs_type,
            c.title.as_deref().unwrap_or("(untitled)")
        ));
        if !c.reasons.is_empty() {
            out.push_str(&format!("\n          {}", c.reasons.join("; ")));
        }
    }
    out
}

pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    let analysis = analyze(&ws.store, &analyze_options(&ws, args), now_ms())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_analysis(&analysis));
        if !analysis.candidates.is_empty() {
            let ids: Vec<String> = analysis.candidate_ids().iter().map(i64::to_string).collect();
            println!("\nApply with: tidemark shrink execute {}", ids.join(" "));
        }
    }
    Ok(())
}

/// Run [`execute`] and append the result to the audit log.
///
/// Neither a failed project lookup nor a failed log write fails the
/// execution; both are reported and the outcome stands.
pub fn execute_logged(
    ws: &Workspace,
    ids: &[i64],
    mode: ShrinkMode,
) -> anyhow::Result<ShrinkOutcome> {
    let projects: BTreeSet<String> =
        match ws.store.observations_by_ids(ids, OrderBy::DateAsc, None, None) {
            Ok(found) => found.into_iter().map(|o| o.project).collect(),
            Err(e) => {
                warn!(error = %e, "cannot resolve projects for shrink log");
                BTreeSet::new()
            }
        };

    let outcome = execute(&ws.store, ids, mode)?;

    let record = ShrinkRecord {
        timestamp: chrono::Utc::now(),
        mode: mode.as_str().to_string(),
        requested: ids.len(),
        deleted: outcome.deleted,
        failed: outcome.failed,
        summarized: outcome.summarized,
        projects: projects.into_iter().collect(),
        observation_ids: ids.to_vec(),
    };
    if let Err(e) = append_jsonl(&ws.paths.shrink_log(), &record) {
        warn!(error = %e, "cannot append to shrink log");
    }
    Ok(outcome)
}

pub fn run_execute(ids: &[i64], mode: &str) -> anyhow::Result<()> {
    let mode: ShrinkMode = mode.parse()?;
    let ws = Workspace::open()?;
    let outcome = execute_logged(&ws, ids, mode)?;

    println!("Deleted: {}", outcome.deleted);
    println!("Failed:  {}", outcome.failed);
    if let Some(summarized) = outcome.summarized {
        println!("Summarized: {}", summarized);
    }
    Ok(())
}

fn compute_stats(records: &[ShrinkRecord]) -> String {
    if records.is_empty() {
        return "No shrink runs to analyze.".to_string();
    }
    let runs = records.len();
    let requested: usize = records.iter().map(|r| r.requested).sum();
    let deleted: usize = records.iter().map(|r| r.deleted).sum();
    let summarized: usize = records.iter().filter_map(|r| r.summarized).sum();
    let avg_failure = records.iter().map(ShrinkRecord::failure_ratio).sum::<f64>() / runs as f64;

    format!(
        "Total runs: {}\n\
         Requested: {} observations\n\
         Deleted: {} observations\n\
         Folded into summaries: {}\n\
         Avg failure: {:.1}%",
        runs,
        requested,
        deleted,
        summarized,
        avg_failure * 100.0
    )
}

pub fn run_history(stats: bool) -> anyhow::Result<()> {
    let paths = tidemark_telemetry::Paths::new()?;
    let records: Vec<ShrinkRecord> = read_jsonl(&paths.shrink_log())?;

    if records.is_empty() {
        println!("No shrink history");
        return Ok(());
    }

    if stats {
        println!("{}", compute_stats(&records));
        return Ok(());
    }

    let recent: Vec<&ShrinkRecord> = records.iter().rev().take(HISTORY_LIMIT).collect();
    println!("Recent Shrink Runs (last {})", recent.len());
    println!("===========================");
    for r in recent {
        println!(
            "  {} | {:<9} requested:{} deleted:{} failed:{} | {}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.mode,
            r.requested,
            r.deleted,
            r.failed,
            r.projects.join(",")
        );
    }
    Ok(())
}
