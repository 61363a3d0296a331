// ── Dashboard ──
//
// Session facade owning the client, the store and the poller. `start`
// installs the recurring polls and the selection-driven restarts; the
// `select_*` helpers additionally fetch once so a view never waits a full
// interval for its first data. Poll errors are logged at debug and
// dropped; one-shot fetches and commands return them. Every poll races its
// request against the loop's token, so a cancelled loop never writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use flowdeck_api::types::{BackfillRequest, TriggerDagRunRequest};
use flowdeck_api::{FlowClient, ListOptions, Pacer, TransportConfig};

use crate::command::{Command, CommandResult, effective_conf};
use crate::config::DashboardConfig;
use crate::convert::collect;
use crate::error::CoreError;
use crate::model::{
    ConfigSection, Connection, HealthSnapshot, Panel, TaskDefinition, TaskInstance, Variable,
    Workflow, WorkflowRun,
};
use crate::poller::Poller;
use crate::store::{EventKind, StateStore, StoreEvent, SubscriptionId};

/// Page size of the workflow poll.
pub const WORKFLOW_LIMIT: u32 = 100;
/// Page size of the runs poll (newest first).
pub const RUN_LIMIT: u32 = 50;
/// Page size of the task-instance poll.
pub const TASK_LIMIT: u32 = 100;
/// Page size of connection and variable listings.
pub const RESOURCE_LIMIT: u32 = 100;

/// Dynamic loop following the selected workflow.
pub const RUNS_LOOP: &str = "runs";
/// Dynamic loop following the selected run.
pub const TASKS_LOOP: &str = "tasks";

fn runs_options() -> ListOptions {
    ListOptions::limit(RUN_LIMIT).order_by("-start_date")
}

/// Client, store and poller of one orchestrator session.
///
/// Cheaply cloneable; all clones share state.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<Inner>,
}

struct Inner {
    config: DashboardConfig,
    client: Arc<FlowClient>,
    store: Arc<StateStore>,
    poller: Poller,
    cancel: CancellationToken,
    started: AtomicBool,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl Dashboard {
    /// Build the session. Must be called inside a tokio runtime; polling
    /// loops spawn on it.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = FlowClient::new(config.url.as_str(), config.auth.clone().into(), &transport)?
            .with_pacer(Pacer::new(config.request_pace));

        let cancel = CancellationToken::new();
        let poller = Poller::new(&cancel);
        let store = Arc::new(StateStore::new(config.cache_ttl));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                client: Arc::new(client),
                store,
                poller,
                cancel,
                started: AtomicBool::new(false),
                subscriptions: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &Arc<FlowClient> {
        &self.inner.client
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    pub fn poller(&self) -> &Poller {
        &self.inner.poller
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the recurring polls and the selection wiring. Idempotent.
    ///
    /// - workflows and health: fixed loops, first fetch immediately
    /// - runs: restarted on every workflow selection
    /// - task instances: restarted on every run selection
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let intervals = self.inner.config.intervals;

        let (client, store) = self.handles();
        self.inner
            .poller
            .fixed(intervals.workflows, true, move |token| {
                let (client, store) = (Arc::clone(&client), Arc::clone(&store));
                async move {
                    let opts = ListOptions::limit(WORKFLOW_LIMIT);
                    tokio::select! {
                        biased;
                        () = token.cancelled() => {}
                        res = client.list_dags(&opts) => match res {
                            Ok(page) => store.set_workflows(collect(page.dags)),
                            Err(e) => debug!(error = %e, "workflow poll failed"),
                        },
                    }
                }
            });

        let (client, store) = self.handles();
        self.inner.poller.fixed(intervals.health, true, move |token| {
            let (client, store) = (Arc::clone(&client), Arc::clone(&store));
            async move {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {}
                    res = client.health() => match res {
                        Ok(health) => store.set_health(health.into()),
                        Err(e) => debug!(error = %e, "health poll failed"),
                    },
                }
            }
        });

        let weak = Arc::downgrade(&self.inner);
        let runs_sub = self
            .inner
            .store
            .subscribe(EventKind::WorkflowSelected, move |event| {
                if let StoreEvent::WorkflowSelected(workflow_id) = event {
                    restart_runs_loop(&weak, workflow_id);
                }
            });

        let weak = Arc::downgrade(&self.inner);
        let tasks_sub = self
            .inner
            .store
            .subscribe(EventKind::RunSelected, move |event| {
                if let StoreEvent::RunSelected(run_id) = event {
                    restart_tasks_loop(&weak, run_id);
                }
            });

        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([runs_sub, tasks_sub]);

        info!(url = %self.inner.config.url, "dashboard started");
    }

    /// Cancel every poll. Returns immediately.
    pub fn stop(&self) {
        self.inner.poller.stop();
    }

    /// Cancel every poll, wait for the loops to exit, and detach the
    /// selection wiring from the store.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.poller.shutdown().await;
        let subs = std::mem::take(
            &mut *self
                .inner
                .subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for id in subs {
            self.inner.store.unsubscribe(id);
        }
        info!("dashboard stopped");
    }

    fn handles(&self) -> (Arc<FlowClient>, Arc<StateStore>) {
        (
            Arc::clone(&self.inner.client),
            Arc::clone(&self.inner.store),
        )
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Select a workflow and fetch its runs right away.
    pub async fn select_workflow(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, CoreError> {
        debug!(workflow_id, "workflow selected");
        self.inner.store.select_workflow(workflow_id);
        self.fetch_runs(workflow_id).await
    }

    /// Select a run of the current workflow, switch to the tasks panel,
    /// and fetch its task instances right away.
    pub async fn select_run(&self, run_id: &str) -> Result<Vec<TaskInstance>, CoreError> {
        debug!(run_id, "run selected");
        let store = &self.inner.store;
        store.select_run(run_id);
        store.set_active_panel(Panel::Tasks);

        let selection = store.selection();
        let workflow_id = selection.workflow().ok_or_else(|| CoreError::ValidationFailed {
            message: "select a workflow before selecting a run".into(),
        })?;
        self.fetch_task_instances(workflow_id, run_id).await
    }

    /// Select a task of the current run, switch to the logs panel, and
    /// fetch the log of its latest attempt.
    pub async fn select_task(&self, task_id: &str) -> Result<String, CoreError> {
        debug!(task_id, "task selected");
        let store = &self.inner.store;
        store.select_task(task_id);
        store.set_active_panel(Panel::Logs);

        let selection = store.selection();
        let (Some(workflow_id), Some(run_id)) = (selection.workflow(), selection.run()) else {
            return Err(CoreError::ValidationFailed {
                message: "select a workflow and a run before selecting a task".into(),
            });
        };
        let try_number = store
            .task_instances(workflow_id, run_id)
            .iter()
            .find(|t| t.task_id == task_id)
            .map_or(1, |t| t.try_number);
        self.task_logs(workflow_id, run_id, task_id, try_number).await
    }

    // ── One-shot fetches ─────────────────────────────────────────────

    /// Fetch workflows and replace the cached collection.
    pub async fn fetch_workflows(&self) -> Result<Vec<Workflow>, CoreError> {
        let page = self
            .inner
            .client
            .list_dags(&ListOptions::limit(WORKFLOW_LIMIT))
            .await?;
        let workflows: Vec<Workflow> = collect(page.dags);
        self.inner.store.set_workflows(workflows.clone());
        Ok(workflows)
    }

    /// Fetch the newest runs of a workflow and cache them.
    pub async fn fetch_runs(&self, workflow_id: &str) -> Result<Vec<WorkflowRun>, CoreError> {
        let page = self
            .inner
            .client
            .list_dag_runs(workflow_id, &runs_options())
            .await
            .map_err(|e| not_found_as_workflow(e, workflow_id))?;
        let runs: Vec<WorkflowRun> = collect(page.dag_runs);
        debug!(workflow_id, count = runs.len(), "runs fetched");
        self.inner.store.set_runs(workflow_id, runs.clone());
        Ok(runs)
    }

    /// Fetch the task instances of one run and cache them.
    pub async fn fetch_task_instances(
        &self,
        workflow_id: &str,
        run_id: &str,
    ) -> Result<Vec<TaskInstance>, CoreError> {
        let page = self
            .inner
            .client
            .list_task_instances(workflow_id, run_id, &ListOptions::limit(TASK_LIMIT))
            .await?;
        let tasks: Vec<TaskInstance> = collect(page.task_instances);
        debug!(workflow_id, run_id, count = tasks.len(), "task instances fetched");
        self.inner
            .store
            .set_task_instances(workflow_id, run_id, tasks.clone());
        Ok(tasks)
    }

    /// Fetch health and replace the cached snapshot.
    pub async fn fetch_health(&self) -> Result<HealthSnapshot, CoreError> {
        let health = HealthSnapshot::from(self.inner.client.health().await?);
        self.inner.store.set_health(health.clone());
        Ok(health)
    }

    /// Rendered log of one task attempt. `try_number <= 0` means the first.
    pub async fn task_logs(
        &self,
        workflow_id: &str,
        run_id: &str,
        task_id: &str,
        try_number: i64,
    ) -> Result<String, CoreError> {
        Ok(self
            .inner
            .client
            .task_logs(workflow_id, run_id, task_id, try_number)
            .await?)
    }

    pub async fn workflow_source(&self, workflow_id: &str) -> Result<String, CoreError> {
        self.inner
            .client
            .dag_source(workflow_id)
            .await
            .map_err(|e| not_found_as_workflow(e, workflow_id))
    }

    pub async fn task_definitions(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<TaskDefinition>, CoreError> {
        let page = self
            .inner
            .client
            .list_tasks(workflow_id)
            .await
            .map_err(|e| not_found_as_workflow(e, workflow_id))?;
        Ok(collect(page.tasks))
    }

    pub async fn connections(&self) -> Result<Vec<Connection>, CoreError> {
        let page = self
            .inner
            .client
            .list_connections(&ListOptions::limit(RESOURCE_LIMIT))
            .await?;
        Ok(collect(page.connections))
    }

    pub async fn variables(&self) -> Result<Vec<Variable>, CoreError> {
        let page = self
            .inner
            .client
            .list_variables(&ListOptions::limit(RESOURCE_LIMIT))
            .await?;
        Ok(collect(page.variables))
    }

    /// The orchestrator's own configuration, where the server exposes it.
    pub async fn orchestrator_config(&self) -> Result<Vec<ConfigSection>, CoreError> {
        let config = self.inner.client.config().await?;
        Ok(collect(config.sections))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate and execute a write against the orchestrator.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        command.validate()?;
        let client = &self.inner.client;

        match command {
            Command::TriggerRun {
                workflow_id,
                logical_date,
                conf,
            } => {
                let request = TriggerDagRunRequest {
                    logical_date,
                    conf: effective_conf(conf),
                };
                let run = client
                    .trigger_dag_run(&workflow_id, &request)
                    .await
                    .map_err(|e| not_found_as_workflow(e, &workflow_id))?;
                info!(%workflow_id, run_id = %run.dag_run_id, "run triggered");
                Ok(CommandResult::Triggered(run.into()))
            }
            Command::SetPaused {
                workflow_id,
                paused,
            } => self.set_paused(&workflow_id, paused).await,
            Command::TogglePause { workflow_id } => {
                let workflow = self.inner.store.workflow(&workflow_id).ok_or_else(|| {
                    CoreError::WorkflowNotFound {
                        workflow_id: workflow_id.clone(),
                    }
                })?;
                self.set_paused(&workflow_id, !workflow.is_paused).await
            }
            Command::CreateBackfill {
                workflow_id,
                from_date,
                to_date,
                max_active_runs,
                run_conf,
            } => {
                let request = BackfillRequest {
                    dag_id: workflow_id,
                    from_date,
                    to_date,
                    max_active_runs: (max_active_runs > 0).then_some(max_active_runs),
                    dag_run_conf: effective_conf(run_conf),
                };
                let backfill = client
                    .create_backfill(&request)
                    .await
                    .map_err(|e| not_found_as_workflow(e, &request.dag_id))?;
                info!(workflow_id = %request.dag_id, id = backfill.id, "backfill created");
                Ok(CommandResult::Backfill(backfill.into()))
            }
        }
    }

    async fn set_paused(&self, workflow_id: &str, paused: bool) -> Result<CommandResult, CoreError> {
        self.inner
            .client
            .set_paused(workflow_id, paused)
            .await
            .map_err(|e| not_found_as_workflow(e, workflow_id))?;
        self.inner
            .store
            .update_workflow(workflow_id, |w| w.is_paused = paused);
        info!(workflow_id, paused, "pause state changed");
        Ok(CommandResult::PauseSet { paused })
    }
}

// ── Selection-driven loops ───────────────────────────────────────────

fn restart_runs_loop(weak: &Weak<Inner>, workflow_id: &str) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let client = Arc::clone(&inner.client);
    let store = Arc::clone(&inner.store);
    let workflow_id = workflow_id.to_owned();

    inner
        .poller
        .restart(RUNS_LOOP, inner.config.intervals.runs, move |token| {
            let (client, store, workflow_id) =
                (Arc::clone(&client), Arc::clone(&store), workflow_id.clone());
            async move {
                let opts = runs_options();
                tokio::select! {
                    biased;
                    () = token.cancelled() => debug!(%workflow_id, "runs poll abandoned"),
                    res = client.list_dag_runs(&workflow_id, &opts) => match res {
                        Ok(page) => store.set_runs(&workflow_id, collect(page.dag_runs)),
                        Err(e) => debug!(%workflow_id, error = %e, "runs poll failed"),
                    },
                }
            }
        });
}

fn restart_tasks_loop(weak: &Weak<Inner>, run_id: &str) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let Some(workflow_id) = inner.store.selection().workflow().map(str::to_owned) else {
        return;
    };
    let client = Arc::clone(&inner.client);
    let store = Arc::clone(&inner.store);
    let run_id = run_id.to_owned();

    inner
        .poller
        .restart(TASKS_LOOP, inner.config.intervals.tasks, move |token| {
            let (client, store) = (Arc::clone(&client), Arc::clone(&store));
            let (workflow_id, run_id) = (workflow_id.clone(), run_id.clone());
            async move {
                let opts = ListOptions::limit(TASK_LIMIT);
                tokio::select! {
                    biased;
                    () = token.cancelled() => debug!(%workflow_id, %run_id, "task poll abandoned"),
                    res = client.list_task_instances(&workflow_id, &run_id, &opts) => match res {
                        Ok(page) => {
                            store.set_task_instances(&workflow_id, &run_id, collect(page.task_instances));
                        }
                        Err(e) => debug!(%workflow_id, %run_id, error = %e, "task poll failed"),
                    },
                }
            }
        });
}

fn not_found_as_workflow(err: flowdeck_api::Error, workflow_id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::WorkflowNotFound {
            workflow_id: workflow_id.to_owned(),
        }
    } else {
        err.into()
    }
}
