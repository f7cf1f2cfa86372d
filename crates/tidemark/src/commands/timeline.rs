use super::search::format_row;
use super::Workspace;
use crate::cli::TimelineArgs;
use tidemark_retrieval::{timeline, Anchor, IndexEntry, Timeline, TimelineRequest};

fn build_request(ws: &Workspace, args: &TimelineArgs) -> anyhow::Result<TimelineRequest> {
    Ok(TimelineRequest {
        project: Some(args.project.clone()),
        anchor: args.anchor.as_deref().map(str::parse::<Anchor>).transpose()?,
        query: args.query.clone(),
        depth_before: args.before.unwrap_or(ws.config.retrieval.depth_before),
        depth_after: args.after.unwrap_or(ws.config.retrieval.depth_after),
    })
}

fn render(window: &Timeline) -> Vec<String> {
    window
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = if i == window.anchor_index { ">" } else { " " };
            format!("{} {}", marker, format_row(&item.index_row()))
        })
        .collect()
}

pub fn run(args: &TimelineArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    let window = timeline(&ws.store, &build_request(&ws, args)?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&window)?);
        return Ok(());
    }

    println!(
        "Timeline for {} ({} before, {} after)",
        args.project,
        window.before().len(),
        window.after().len()
    );
    for line in render(&window) {
        println!("{}", line);
    }
    Ok(())
}
