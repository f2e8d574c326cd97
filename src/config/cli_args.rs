//! Command-line surface.
//!
//! Connection and tuning flags are global so they can be given before or
//! after the subcommand. Every one of them is optional here; defaults and the
//! environment are applied later by [`crate::app_config::AppConfig::merge`].

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "index_migrator",
    version,
    about = "Zero-downtime mapping migrations and reindex monitoring for Elasticsearch"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Comma-separated cluster hosts (ES_DB_URL)
    #[arg(long, global = true)]
    pub es_url: Option<String>,

    /// Basic-auth user name (ES_ID)
    #[arg(long, global = true)]
    pub es_id: Option<String>,

    /// Basic-auth password (ES_PW)
    #[arg(long, global = true)]
    pub es_pw: Option<String>,

    /// Per-request timeout in seconds (ES_REQUEST_TIMEOUT)
    #[arg(long, global = true)]
    pub request_timeout: Option<u64>,

    /// Task poll interval in milliseconds (MIGRATE_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Documents per reindex scroll batch (MIGRATE_BATCH_SIZE)
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Reindex slices (MIGRATE_SLICES)
    #[arg(long, global = true)]
    pub slices: Option<u32>,

    /// Bound on the whole run in seconds (MIGRATE_UPDATE_TIMEOUT)
    #[arg(long, global = true)]
    pub update_timeout: Option<u64>,

    /// Log level spec (RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply a mapping to an index or alias, reindexing when needed
    Migrate(MigrateArgs),
    /// Copy documents from one index into another
    Reindex(ReindexArgs),
    /// Follow an already running task
    Task(TaskArgs),
}

#[derive(Debug, Clone, Args)]
pub struct MigrateArgs {
    /// Index or alias to migrate
    pub target: String,

    /// JSON file with the desired mapping
    #[arg(long)]
    pub mapping: String,

    /// Fall back to reindex + alias swap when the in-place update is rejected
    #[arg(long)]
    pub zero_downtime: bool,

    /// The target must end up as an alias
    #[arg(long)]
    pub force_alias: bool,

    /// Delete the migrated source index after the cutover
    #[arg(long)]
    pub delete_old_index: bool,

    /// Apply the in-place update to the alias' write index only
    #[arg(long)]
    pub write_index_only: bool,

    /// Do not ask before destructive steps
    #[arg(long)]
    pub non_interactive: bool,

    #[arg(long)]
    pub requests_per_second: Option<f32>,
}

#[derive(Debug, Clone, Args)]
pub struct ReindexArgs {
    pub source: String,

    pub dest: String,

    /// JSON file holding a query DSL object
    #[arg(long)]
    pub query: Option<String>,

    /// Painless script source
    #[arg(long)]
    pub script: Option<String>,

    /// Ingest pipeline for the destination
    #[arg(long)]
    pub pipeline: Option<String>,

    #[arg(long)]
    pub requests_per_second: Option<f32>,

    /// Block until the reindex is done instead of polling a task
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TaskArgs {
    /// Task id as `<node>:<number>`
    pub task_id: String,
}
