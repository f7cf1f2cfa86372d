use super::{format_epoch, obs_types, scope, Workspace};
use crate::cli::SearchArgs;
use tidemark_core::IndexRow;
use tidemark_retrieval::{parse_date_bound, search, DateBound, SearchRequest};

fn build_request(ws: &Workspace, args: &SearchArgs) -> anyhow::Result<SearchRequest> {
    Ok(SearchRequest {
        query: args.query.clone(),
        scope: scope(args.project.as_deref(), args.all_projects),
        limit: args.limit.unwrap_or(ws.config.retrieval.search_limit),
        search_type: args.search_type.as_deref().map(str::parse).transpose()?,
        date_start: args
            .since
            .as_deref()
            .map(|s| parse_date_bound("since", s, DateBound::Start))
            .transpose()?,
        date_end: args
            .until
            .as_deref()
            .map(|s| parse_date_bound("until", s, DateBound::End))
            .transpose()?,
        obs_types: obs_types(args.obs_type.as_deref()),
        order: args.order.parse()?,
    })
}

pub fn format_row(row: &IndexRow) -> String {
    format!(
        "{:>6}  {}  {} {}  (read ~{}, work ~{})",
        row_ref(row),
        format_epoch(row.created_at_epoch),
        row.glyph,
        row.title,
        row.read_tokens,
        row.work_tokens
    )
}

/// Id as accepted by the timeline anchor
fn row_ref(row: &IndexRow) -> String {
    match row.kind {
        tidemark_core::RecordKind::Observation => format!("#{}", row.id),
        tidemark_core::RecordKind::Session => format!("S{}", row.id),
        tidemark_core::RecordKind::Prompt => format!("P{}", row.id),
    }
}

pub fn run(args: &SearchArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    let rows = search(&ws.store, &build_request(&ws, args)?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let read: usize = rows.iter().map(|r| r.read_tokens).sum();
    println!("{} results (~{} tokens to read all)", rows.len(), read);
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}
