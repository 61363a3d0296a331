//! Trigger, pause/unpause and backfill.

use flowdeck_core::{Command as CoreCommand, CommandResult, Dashboard};

use crate::cli::{BackfillArgs, GlobalOpts, TriggerArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn trigger(
    dashboard: &Dashboard,
    args: TriggerArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let logical_date = args
        .logical_date
        .as_deref()
        .map(|raw| util::parse_date("logical-date", raw))
        .transpose()?;
    let conf = util::parse_conf(args.conf.as_deref())?;

    if !util::confirm(
        &format!("Trigger a new run of '{}'?", args.workflow),
        "trigger",
        global.yes,
    )? {
        return Ok(());
    }

    let result = dashboard
        .execute(CoreCommand::TriggerRun {
            workflow_id: args.workflow,
            logical_date,
            conf,
        })
        .await?;
    report(&result, global)
}

pub async fn set_paused(
    dashboard: &Dashboard,
    workflow: String,
    paused: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let verb = if paused { "pause" } else { "unpause" };
    if !util::confirm(&format!("{verb} '{workflow}'?"), verb, global.yes)? {
        return Ok(());
    }

    let result = dashboard
        .execute(CoreCommand::SetPaused {
            workflow_id: workflow,
            paused,
        })
        .await?;
    report(&result, global)
}

pub async fn backfill(
    dashboard: &Dashboard,
    args: BackfillArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let from_date = util::parse_date("from", &args.from)?;
    let to_date = util::parse_date("to", &args.to)?;
    let run_conf = util::parse_conf(args.conf.as_deref())?;

    if !util::confirm(
        &format!(
            "Backfill '{}' from {} to {}?",
            args.workflow,
            from_date.date_naive(),
            to_date.date_naive()
        ),
        "backfill",
        global.yes,
    )? {
        return Ok(());
    }

    let result = dashboard
        .execute(CoreCommand::CreateBackfill {
            workflow_id: args.workflow,
            from_date,
            to_date,
            max_active_runs: args.max_active_runs,
            run_conf,
        })
        .await?;
    report(&result, global)
}

fn report(result: &CommandResult, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match result {
        CommandResult::Triggered(run) => output::render_single(
            &global.output,
            run,
            |r| format!("Triggered {} ({})", r.run_id, r.state),
            |r| r.run_id.clone(),
        )?,
        CommandResult::PauseSet { paused } => {
            let label = if *paused { "Paused" } else { "Unpaused" };
            label.to_owned()
        }
        CommandResult::Backfill(summary) => output::render_single(
            &global.output,
            summary,
            |b| {
                format!(
                    "Backfill {} created for {} ({} to {})",
                    b.id,
                    b.workflow_id,
                    b.from_date.date_naive(),
                    b.to_date.date_naive()
                )
            },
            |b| b.id.to_string(),
        )?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
