//! `flowdeck watch`: run the dashboard's poll loops and stream changes.
//!
//! Store notifications are forwarded through a channel; runs and task
//! instances emit nothing when refreshed, so they are diffed from the cache
//! on a short tick instead.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use flowdeck_core::{Dashboard, EventKind, RunState, StoreEvent, TaskState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

const DIFF_TICK: Duration = Duration::from_millis(500);

const KINDS: [EventKind; 6] = [
    EventKind::WorkflowsUpdated,
    EventKind::HealthUpdated,
    EventKind::WorkflowSelected,
    EventKind::RunSelected,
    EventKind::TaskSelected,
    EventKind::PanelChanged,
];

pub async fn watch(dashboard: &Dashboard, args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<StoreEvent>();
    let store = dashboard.store();
    let subscriptions: Vec<_> = KINDS
        .iter()
        .map(|&kind| {
            let tx = tx.clone();
            store.subscribe(kind, move |event| {
                let _ = tx.send(event.clone());
            })
        })
        .collect();
    drop(tx);

    dashboard.start();
    let result = follow(dashboard, args, global, &mut rx, tokio::signal::ctrl_c()).await;

    for id in subscriptions {
        store.unsubscribe(id);
    }
    dashboard.shutdown().await;
    result
}

/// Stream until `interrupt` resolves or the event channel closes.
async fn follow<I: Future>(
    dashboard: &Dashboard,
    args: &WatchArgs,
    global: &GlobalOpts,
    rx: &mut mpsc::UnboundedReceiver<StoreEvent>,
    interrupt: I,
) -> Result<(), CliError> {
    if let Some(ref workflow) = args.workflow {
        dashboard.select_workflow(workflow).await?;
        if let Some(ref run) = args.run {
            dashboard.select_run(run).await?;
        }
    }

    let mut printer = Printer::new(global);
    let mut diff = StateDiff::default();
    let mut tick = tokio::time::interval(DIFF_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // One listener for the whole loop, so a signal that lands while a
    // line is being printed is not lost.
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            biased;

            _ = &mut interrupt => {
                debug!("interrupted, stopping watch");
                return Ok(());
            }

            event = rx.recv() => {
                let Some(event) = event else { return Ok(()) };
                printer.event(&event);
            }

            _ = tick.tick() => {
                for line in diff.scan(dashboard) {
                    printer.line("state", &line);
                }
            }
        }
    }
}

// ── Output ──────────────────────────────────────────────────────────

struct Printer {
    json: bool,
    quiet: bool,
    /// Last line printed per event kind; repeats are suppressed.
    last: HashMap<EventKind, String>,
}

impl Printer {
    fn new(global: &GlobalOpts) -> Self {
        Self {
            json: matches!(global.output, OutputFormat::Json | OutputFormat::JsonCompact),
            quiet: global.quiet,
            last: HashMap::new(),
        }
    }

    fn event(&mut self, event: &StoreEvent) {
        let kind = event.kind();
        let text = describe(event);
        if self.last.get(&kind) == Some(&text) {
            return;
        }
        self.line(&kind.to_string(), &text);
        self.last.insert(kind, text);
    }

    fn line(&self, kind: &str, text: &str) {
        let out = if self.json {
            serde_json::json!({
                "at": Local::now().to_rfc3339(),
                "event": kind,
                "detail": text,
            })
            .to_string()
        } else {
            format!("{} {kind:<18} {text}", Local::now().format("%H:%M:%S"))
        };
        output::print_output(&out, self.quiet);
    }
}

fn describe(event: &StoreEvent) -> String {
    match event {
        StoreEvent::WorkflowsUpdated(workflows) => {
            let paused = workflows.iter().filter(|w| w.is_paused).count();
            let broken = workflows.iter().filter(|w| w.has_import_errors).count();
            format!(
                "{} workflows, {paused} paused, {broken} with import errors",
                workflows.len()
            )
        }
        StoreEvent::HealthUpdated(health) => health
            .components()
            .into_iter()
            .filter_map(|(name, c)| c.map(|c| format!("{name}={}", output::or_dash(c.status.as_deref()))))
            .collect::<Vec<_>>()
            .join(" "),
        StoreEvent::WorkflowSelected(id) => format!("workflow {id}"),
        StoreEvent::RunSelected(id) => format!("run {id}"),
        StoreEvent::TaskSelected(id) => format!("task {id}"),
        StoreEvent::PanelChanged(panel) => format!("panel {panel}"),
    }
}

// ── Cache diffing ───────────────────────────────────────────────────

/// Remembers the last seen state of each run and task instance under the
/// current selection.
#[derive(Default)]
struct StateDiff {
    workflow: String,
    run: String,
    runs: HashMap<String, RunState>,
    tasks: HashMap<String, (TaskState, i64)>,
}

impl StateDiff {
    fn scan(&mut self, dashboard: &Dashboard) -> Vec<String> {
        let store = dashboard.store();
        let selection = store.selection();
        let mut lines = Vec::new();

        if selection.workflow_id != self.workflow {
            self.workflow.clone_from(&selection.workflow_id);
            self.runs.clear();
        }
        if selection.run_id != self.run {
            self.run.clone_from(&selection.run_id);
            self.tasks.clear();
        }

        let Some(workflow) = selection.workflow() else {
            return lines;
        };
        for run in store.runs(workflow) {
            let prev = self.runs.insert(run.run_id.clone(), run.state);
            if prev != Some(run.state) {
                lines.push(transition("run", &run.run_id, prev, run.state));
            }
        }

        let Some(run_id) = selection.run() else {
            return lines;
        };
        for task in store.task_instances(workflow, run_id) {
            let key = task.name().to_owned();
            let now = (task.state, task.try_number);
            let prev = self.tasks.insert(key.clone(), now);
            if prev != Some(now) {
                let label = format!("{key} (try {})", task.try_number);
                lines.push(transition("task", &label, prev.map(|p| p.0), task.state));
            }
        }
        lines
    }
}

fn transition<S: std::fmt::Display + PartialEq>(what: &str, id: &str, prev: Option<S>, now: S) -> String {
    match prev {
        Some(prev) if prev != now => format!("{what} {id}: {prev} -> {now}"),
        _ => format!("{what} {id}: {now}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use flowdeck_config::{AuthType, Config};

    use super::*;
    use crate::cli::{Cli, Command};

    fn quiet_watch() -> (GlobalOpts, WatchArgs) {
        let cli = Cli::try_parse_from(["flowdeck", "-q", "watch"]).unwrap();
        match cli.command {
            Command::Watch(args) => (cli.global, args),
            other => panic!("parsed {other:?}"),
        }
    }

    fn offline_dashboard() -> Dashboard {
        let mut config = Config::default();
        config.orchestrator.base_url = "http://127.0.0.1:1".into();
        config.orchestrator.auth.kind = AuthType::Token;
        config.orchestrator.auth.token = Some("t".into());
        Dashboard::new(flowdeck_config::to_dashboard_config(&config).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn interrupt_arriving_between_events_stops_the_stream() {
        let dashboard = offline_dashboard();
        let (global, args) = quiet_watch();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            for i in 0..50 {
                tx.send(StoreEvent::WorkflowSelected(format!("wf{i}"))).unwrap();
                tokio::task::yield_now().await;
            }
            stop_tx.send(()).unwrap();
            // Keep the channel open so only the interrupt can end the loop.
            std::future::pending::<()>().await;
        });

        let interrupt = async move {
            let _ = stop_rx.await;
        };
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            follow(&dashboard, &args, &global, &mut rx, interrupt),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[test]
    fn transitions_show_previous_state_when_known() {
        assert_eq!(
            transition("run", "manual_1", Some(RunState::Queued), RunState::Running),
            "run manual_1: queued -> running"
        );
        assert_eq!(
            transition("run", "manual_1", None, RunState::Success),
            "run manual_1: success"
        );
        assert_eq!(
            transition("task", "extract (try 2)", Some(TaskState::Failed), TaskState::Failed),
            "task extract (try 2): failed"
        );
    }

    #[test]
    fn selection_events_describe_their_target() {
        assert_eq!(
            describe(&StoreEvent::WorkflowSelected("etl".into())),
            "workflow etl"
        );
        assert_eq!(
            describe(&StoreEvent::PanelChanged(flowdeck_core::Panel::Logs)),
            "panel logs"
        );
    }
}
