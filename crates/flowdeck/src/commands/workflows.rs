//! Workflow, run and task listing.

use chrono::Utc;
use tabled::Tabled;

use flowdeck_core::{Dashboard, TaskDefinition, TaskInstance, Workflow, WorkflowRun};

use crate::cli::{GlobalOpts, RunsCommand, TasksCommand, WorkflowsCommand};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct WorkflowRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Paused")]
    paused: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Owners")]
    owners: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&Workflow> for WorkflowRow {
    fn from(w: &Workflow) -> Self {
        let paused = if w.is_paused { "yes" } else { "no" };
        Self {
            id: w.id.clone(),
            paused: if w.has_import_errors {
                format!("{paused} (import errors)")
            } else {
                paused.into()
            },
            schedule: w.schedule_label().to_owned(),
            owners: w.owners.join(", "),
            tags: w.tags.join(", "),
        }
    }
}

#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Run ID")]
    run_id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Type")]
    run_type: String,
    #[tabled(rename = "Logical Date")]
    logical_date: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

fn run_row(r: &WorkflowRun, color: bool) -> RunRow {
    RunRow {
        run_id: r.run_id.clone(),
        state: output::run_state(r.state, color),
        run_type: output::or_dash(r.run_type.as_deref()),
        logical_date: output::timestamp(r.logical_date),
        started: output::timestamp(r.start_date),
        duration: output::duration(r.duration(Utc::now())),
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Try")]
    try_number: i64,
    #[tabled(rename = "Operator")]
    operator: String,
    #[tabled(rename = "Started")]
    started: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

fn task_row(t: &TaskInstance, color: bool) -> TaskRow {
    TaskRow {
        task: t.name().to_owned(),
        state: output::task_state(t.state, color),
        try_number: t.try_number,
        operator: output::or_dash(t.operator.as_deref()),
        started: output::timestamp(t.start_date),
        duration: t
            .duration_secs
            .map_or_else(|| "-".into(), |s| format!("{s:.1}s")),
    }
}

#[derive(Tabled)]
struct DefinitionRow {
    #[tabled(rename = "Task")]
    task_id: String,
    #[tabled(rename = "Operator")]
    operator: String,
    #[tabled(rename = "Retries")]
    retries: u32,
    #[tabled(rename = "Upstream")]
    upstream: String,
    #[tabled(rename = "Downstream")]
    downstream: String,
}

impl From<&TaskDefinition> for DefinitionRow {
    fn from(t: &TaskDefinition) -> Self {
        Self {
            task_id: t.task_id.clone(),
            operator: output::or_dash(t.operator.as_deref()),
            retries: t.retries,
            upstream: t.upstream.join(", "),
            downstream: t.downstream.join(", "),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn workflows(
    dashboard: &Dashboard,
    command: WorkflowsCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        WorkflowsCommand::List { paused, active } => {
            let mut all = dashboard.fetch_workflows().await?;
            all.retain(|w| (!paused || w.is_paused) && (!active || !w.is_paused));
            let out = output::render_list(
                &global.output,
                &all,
                |w| WorkflowRow::from(w),
                |w| w.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

pub async fn runs(
    dashboard: &Dashboard,
    command: RunsCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match command {
        RunsCommand::List { workflow } => {
            let runs = dashboard.fetch_runs(&workflow).await?;
            let out = output::render_list(
                &global.output,
                &runs,
                |r| run_row(r, color),
                |r| r.run_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

pub async fn tasks(
    dashboard: &Dashboard,
    command: TasksCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match command {
        TasksCommand::List { workflow, run } => {
            let tasks = dashboard.fetch_task_instances(&workflow, &run).await?;
            let out = output::render_list(
                &global.output,
                &tasks,
                |t| task_row(t, color),
                |t| t.task_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TasksCommand::Definitions { workflow } => {
            let defs = dashboard.task_definitions(&workflow).await?;
            let out = output::render_list(
                &global.output,
                &defs,
                |t| DefinitionRow::from(t),
                |t| t.task_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
