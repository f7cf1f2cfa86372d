use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(version)]
#[command(about = "Retention and retrieval for long-lived observation logs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, database and default config
    Init,

    /// Load observations, sessions and prompts from a JSONL file
    Ingest {
        /// One JSON object per line, tagged with "kind"
        #[arg(short, long)]
        file: String,
    },

    /// Search the index of a project
    Search(SearchArgs),

    /// Show records around an anchor in time
    Timeline(TimelineArgs),

    /// Fetch full observations by id
    Get(GetArgs),

    /// Analyze or shrink the observation log
    Shrink {
        #[command(subcommand)]
        action: ShrinkAction,
    },

    /// Invoke a named operation with JSON parameters and print the JSON result
    Call {
        /// search, timeline, get_observations, shrink/analyze or shrink/execute
        operation: String,
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Print version information
    Version,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Free text; empty lists everything matching the filters
    #[arg(default_value = "")]
    pub query: String,
    #[arg(short, long)]
    pub project: Option<String>,
    /// Search every project
    #[arg(long, conflicts_with = "project")]
    pub all_projects: bool,
    #[arg(short, long)]
    pub limit: Option<usize>,
    /// observations, sessions or prompts
    #[arg(long = "type")]
    pub search_type: Option<String>,
    /// Comma-separated observation categories
    #[arg(long)]
    pub obs_type: Option<String>,
    /// Earliest creation time (epoch ms, RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,
    /// Latest creation time (epoch ms, RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,
    /// date_desc, date_asc or relevance
    #[arg(long, default_value = "date_desc")]
    pub order: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TimelineArgs {
    /// Observation id, S<id>, P<id> or a timestamp
    #[arg(required_unless_present = "query")]
    pub anchor: Option<String>,
    /// Center on the most recent observation matching this text
    #[arg(short, long, conflicts_with = "anchor")]
    pub query: Option<String>,
    #[arg(short, long)]
    pub project: String,
    #[arg(long)]
    pub before: Option<usize>,
    #[arg(long)]
    pub after: Option<usize>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GetArgs {
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<i64>,
    /// date_desc or date_asc
    #[arg(long, default_value = "date_desc")]
    pub order: String,
    #[arg(short, long)]
    pub limit: Option<usize>,
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum ShrinkAction {
    /// Propose low-importance observations for removal
    Analyze(AnalyzeArgs),

    /// Delete or summarize the given observations
    Execute {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
        /// delete or summarize
        #[arg(long, default_value = "delete")]
        mode: String,
    },

    /// View past shrink executions
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,
    },
}

#[derive(Args)]
pub struct AnalyzeArgs {
    #[arg(short, long)]
    pub project: Option<String>,
    /// Fraction of observations to remove, 0 to 1
    #[arg(long)]
    pub target_reduction: Option<f64>,
    /// Minimum age in days before an observation is considered
    #[arg(long)]
    pub min_age: Option<i64>,
    /// Age in days at which age stops counting in the score
    #[arg(long)]
    pub max_age: Option<i64>,
    #[arg(long)]
    pub min_score: Option<f64>,
    #[arg(long)]
    pub json: bool,
}
