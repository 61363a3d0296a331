//! Command dispatch: bridges CLI args -> dashboard calls -> output formatting.

pub mod actions;
pub mod cluster;
pub mod config_cmd;
pub mod logs;
pub mod util;
pub mod watch;
pub mod workflows;

use flowdeck_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an orchestrator-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Workflows(args) => workflows::workflows(dashboard, args.command, global).await,
        Command::Runs(args) => workflows::runs(dashboard, args.command, global).await,
        Command::Tasks(args) => workflows::tasks(dashboard, args.command, global).await,
        Command::Logs(args) => logs::logs(dashboard, &args, global).await,
        Command::Source { workflow } => logs::source(dashboard, &workflow, global).await,
        Command::Health => cluster::health(dashboard, global).await,
        Command::Connections => cluster::connections(dashboard, global).await,
        Command::Variables => cluster::variables(dashboard, global).await,
        Command::Settings => cluster::settings(dashboard, global).await,
        Command::Trigger(args) => actions::trigger(dashboard, args, global).await,
        Command::Pause { workflow } => actions::set_paused(dashboard, workflow, true, global).await,
        Command::Unpause { workflow } => {
            actions::set_paused(dashboard, workflow, false, global).await
        }
        Command::Backfill(args) => actions::backfill(dashboard, args, global).await,
        Command::Watch(args) => watch::watch(dashboard, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
