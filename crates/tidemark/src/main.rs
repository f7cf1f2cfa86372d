mod cli;
mod commands;
mod tools;

use clap::Parser;
use cli::{Cli, Commands, ShrinkAction};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Ingest { file } => commands::ingest::run(&file),
        Commands::Search(args) => commands::search::run(&args),
        Commands::Timeline(args) => commands::timeline::run(&args),
        Commands::Get(args) => commands::get::run(&args),
        Commands::Shrink { action } => match action {
            ShrinkAction::Analyze(args) => commands::shrink::run_analyze(&args),
            ShrinkAction::Execute { ids, mode } => commands::shrink::run_execute(&ids, &mode),
            ShrinkAction::History { stats } => commands::shrink::run_history(stats),
        },
        Commands::Call { operation, params } => commands::call::run(&operation, &params),
        Commands::Version => commands::version::run(),
    }
}
