//! Clap derive structures for the `flowdeck` CLI.
//!
//! Only depends on clap and clap_complete so `build.rs` can include it to
//! render man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// flowdeck -- watch and drive an Airflow orchestrator from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "flowdeck",
    version,
    about = "Watch and operate Airflow workflows from the terminal",
    long_about = "Lists workflows, runs, task instances and logs from an Airflow 3\n\
        orchestrator, triggers and pauses workflows, and streams live state\n\
        changes with `flowdeck watch`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "FLOWDECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Orchestrator base URL (overrides config)
    #[arg(long, short = 'u', global = true)]
    pub url: Option<String>,

    /// Username for basic auth (overrides config)
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Bearer token; switches auth to token mode
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLOWDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List workflows (DAGs)
    #[command(alias = "wf", alias = "dags")]
    Workflows(WorkflowsArgs),

    /// List runs of a workflow
    Runs(RunsArgs),

    /// List task instances or task definitions
    Tasks(TasksArgs),

    /// Print the log of one task attempt
    Logs(LogsArgs),

    /// Print the source file of a workflow
    Source {
        /// Workflow id
        workflow: String,
    },

    /// Show component health
    Health,

    /// List connections
    Connections,

    /// List variables
    Variables,

    /// Show the orchestrator's own configuration
    Settings,

    /// Trigger a new run
    Trigger(TriggerArgs),

    /// Pause a workflow
    Pause {
        /// Workflow id
        workflow: String,
    },

    /// Unpause a workflow
    Unpause {
        /// Workflow id
        workflow: String,
    },

    /// Create a backfill over a date range
    Backfill(BackfillArgs),

    /// Poll continuously and stream state changes
    Watch(WatchArgs),

    /// Inspect flowdeck configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Listing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WorkflowsArgs {
    #[command(subcommand)]
    pub command: WorkflowsCommand,
}

#[derive(Debug, Subcommand)]
pub enum WorkflowsCommand {
    /// List workflows
    #[command(alias = "ls")]
    List {
        /// Only show paused workflows
        #[arg(long, conflicts_with = "active")]
        paused: bool,

        /// Only show active (unpaused) workflows
        #[arg(long)]
        active: bool,
    },
}

#[derive(Debug, Args)]
pub struct RunsArgs {
    #[command(subcommand)]
    pub command: RunsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RunsCommand {
    /// List the newest runs of a workflow
    #[command(alias = "ls")]
    List {
        /// Workflow id
        workflow: String,
    },
}

#[derive(Debug, Args)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List task instances of a run
    #[command(alias = "ls")]
    List {
        /// Workflow id
        workflow: String,
        /// Run id
        run: String,
    },

    /// List static task definitions of a workflow
    #[command(alias = "defs")]
    Definitions {
        /// Workflow id
        workflow: String,
    },
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Workflow id
    pub workflow: String,
    /// Run id
    pub run: String,
    /// Task id
    pub task: String,

    /// Attempt number (defaults to the latest attempt)
    #[arg(long = "try", short = 't')]
    pub try_number: Option<i64>,
}

// ── Actions ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TriggerArgs {
    /// Workflow id
    pub workflow: String,

    /// Logical date (RFC 3339); defaults to now on the server
    #[arg(long)]
    pub logical_date: Option<String>,

    /// Run configuration as a JSON object
    #[arg(long)]
    pub conf: Option<String>,
}

#[derive(Debug, Args)]
pub struct BackfillArgs {
    /// Workflow id
    pub workflow: String,

    /// Start of the range (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// End of the range (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: String,

    /// Concurrent runs the backfill may start (0 = server default)
    #[arg(long, default_value = "0")]
    pub max_active_runs: u32,

    /// Run configuration as a JSON object
    #[arg(long)]
    pub conf: Option<String>,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Select this workflow and follow its runs
    #[arg(long, short = 'w')]
    pub workflow: Option<String>,

    /// Select this run and follow its task instances (needs --workflow)
    #[arg(long, short = 'r', requires = "workflow")]
    pub run: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store the basic-auth password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
