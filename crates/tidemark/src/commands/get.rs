use super::Workspace;
use crate::cli::GetArgs;
use tidemark_retrieval::{get_observations, FetchRequest};

pub fn run(args: &GetArgs) -> anyhow::Result<()> {
    let ws = Workspace::open()?;
    let request = FetchRequest {
        ids: args.ids.clone(),
        order: args.order.parse()?,
        limit: args.limit,
        project: args.project.clone(),
    };
    let observations = get_observations(&ws.store, &request)?;

    if observations.len() < args.ids.len() {
        eprintln!(
            "{} of {} requested observations found",
            observations.len(),
            args.ids.len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&observations)?);
    Ok(())
}
