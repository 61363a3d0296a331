//! Task logs and workflow source.

use flowdeck_core::Dashboard;
use tracing::debug;

use crate::cli::{GlobalOpts, LogsArgs};
use crate::error::CliError;
use crate::output;

pub async fn logs(dashboard: &Dashboard, args: &LogsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let try_number = match args.try_number {
        Some(n) => n,
        None => latest_attempt(dashboard, args).await?,
    };
    debug!(task = %args.task, try_number, "fetching task log");

    let text = dashboard
        .task_logs(&args.workflow, &args.run, &args.task, try_number)
        .await?;
    output::print_output(text.trim_end(), global.quiet);
    Ok(())
}

async fn latest_attempt(dashboard: &Dashboard, args: &LogsArgs) -> Result<i64, CliError> {
    let tasks = dashboard
        .fetch_task_instances(&args.workflow, &args.run)
        .await?;
    tasks
        .iter()
        .find(|t| t.task_id == args.task)
        .map(|t| t.try_number.max(1))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "task".into(),
            identifier: args.task.clone(),
            list_command: format!("tasks list {} {}", args.workflow, args.run),
        })
}

pub async fn source(dashboard: &Dashboard, workflow: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let text = dashboard.workflow_source(workflow).await?;
    output::print_output(text.trim_end(), global.quiet);
    Ok(())
}
