// ── StateStore ──
//
// All reads hand out copies. Mutations record the refresh instant under
// the write lock and release it before any listener runs; `notify` copies
// the handler list under the read lock and invokes it with no lock held,
// so handlers may call back into the store freely.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::event::{EventKind, Handler, StoreEvent, SubscriptionId};
use super::{HEALTH_KEY, WORKFLOWS_KEY, runs_key, tasks_key};
use crate::config::DEFAULT_CACHE_TTL;
use crate::model::{HealthSnapshot, Panel, TaskInstance, Workflow, WorkflowRun};

/// The operator's drill-down focus. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub workflow_id: String,
    pub run_id: String,
    pub task_id: String,
}

impl Selection {
    pub fn workflow(&self) -> Option<&str> {
        Some(self.workflow_id.as_str()).filter(|s| !s.is_empty())
    }

    pub fn run(&self) -> Option<&str> {
        Some(self.run_id.as_str()).filter(|s| !s.is_empty())
    }

    pub fn task(&self) -> Option<&str> {
        Some(self.task_id.as_str()).filter(|s| !s.is_empty())
    }
}

#[derive(Default)]
struct Inner {
    workflows: Arc<Vec<Workflow>>,
    runs: HashMap<String, Vec<WorkflowRun>>,
    /// Keyed by `"{workflow_id}/{run_id}"`.
    task_instances: HashMap<String, Vec<TaskInstance>>,
    health: Option<Arc<HealthSnapshot>>,

    selection: Selection,
    active_panel: Panel,

    last_refresh: HashMap<String, Instant>,

    subscribers: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    next_subscription: u64,
}

/// Thread-safe cache of orchestrator state plus selection, with
/// publish/subscribe change notification.
///
/// Constructed once by the owner of the session and shared as
/// `Arc<StateStore>`; there is no global instance.
pub struct StateStore {
    inner: RwLock<Inner>,
    ttl: Duration,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl StateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panicking listener never runs under the lock, so a poisoned lock
    // still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Workflows ────────────────────────────────────────────────────

    /// Replace the workflow collection and notify `WorkflowsUpdated`.
    pub fn set_workflows(&self, workflows: Vec<Workflow>) {
        let workflows = Arc::new(workflows);
        {
            let mut inner = self.write();
            inner.workflows = Arc::clone(&workflows);
            inner
                .last_refresh
                .insert(WORKFLOWS_KEY.to_owned(), Instant::now());
        }
        self.notify(&StoreEvent::WorkflowsUpdated(workflows));
    }

    pub fn workflows(&self) -> Vec<Workflow> {
        self.read().workflows.as_ref().clone()
    }

    /// Copy of one cached workflow.
    pub fn workflow(&self, workflow_id: &str) -> Option<Workflow> {
        self.read()
            .workflows
            .iter()
            .find(|w| w.id == workflow_id)
            .cloned()
    }

    /// Patch one cached workflow in place and notify `WorkflowsUpdated`.
    /// Leaves the refresh instant alone. Returns `false` if it isn't cached.
    pub fn update_workflow<F>(&self, workflow_id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut Workflow),
    {
        let workflows = {
            let mut inner = self.write();
            let list = Arc::make_mut(&mut inner.workflows);
            let Some(workflow) = list.iter_mut().find(|w| w.id == workflow_id) else {
                return false;
            };
            patch(workflow);
            Arc::clone(&inner.workflows)
        };
        self.notify(&StoreEvent::WorkflowsUpdated(workflows));
        true
    }

    // ── Runs ─────────────────────────────────────────────────────────

    /// Replace the runs of one workflow. Emits nothing.
    pub fn set_runs(&self, workflow_id: &str, runs: Vec<WorkflowRun>) {
        let mut inner = self.write();
        inner.runs.insert(workflow_id.to_owned(), runs);
        inner.last_refresh.insert(runs_key(workflow_id), Instant::now());
    }

    pub fn runs(&self, workflow_id: &str) -> Vec<WorkflowRun> {
        self.read()
            .runs
            .get(workflow_id)
            .cloned()
            .unwrap_or_default()
    }

    // ── Task instances ───────────────────────────────────────────────

    /// Replace the task instances of one run. Emits nothing.
    pub fn set_task_instances(&self, workflow_id: &str, run_id: &str, tasks: Vec<TaskInstance>) {
        let mut inner = self.write();
        inner
            .task_instances
            .insert(format!("{workflow_id}/{run_id}"), tasks);
        inner
            .last_refresh
            .insert(tasks_key(workflow_id, run_id), Instant::now());
    }

    pub fn task_instances(&self, workflow_id: &str, run_id: &str) -> Vec<TaskInstance> {
        self.read()
            .task_instances
            .get(&format!("{workflow_id}/{run_id}"))
            .cloned()
            .unwrap_or_default()
    }

    // ── Health ───────────────────────────────────────────────────────

    /// Replace the health snapshot and notify `HealthUpdated`.
    pub fn set_health(&self, health: HealthSnapshot) {
        let health = Arc::new(health);
        {
            let mut inner = self.write();
            inner.health = Some(Arc::clone(&health));
            inner.last_refresh.insert(HEALTH_KEY.to_owned(), Instant::now());
        }
        self.notify(&StoreEvent::HealthUpdated(health));
    }

    pub fn health(&self) -> Option<HealthSnapshot> {
        self.read().health.as_deref().cloned()
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Select a workflow. Clears the run and task selection.
    pub fn select_workflow(&self, workflow_id: &str) {
        {
            let mut inner = self.write();
            inner.selection = Selection {
                workflow_id: workflow_id.to_owned(),
                ..Selection::default()
            };
        }
        self.notify(&StoreEvent::WorkflowSelected(workflow_id.to_owned()));
    }

    /// Select a run of the current workflow. Clears the task selection.
    pub fn select_run(&self, run_id: &str) {
        {
            let mut inner = self.write();
            inner.selection.run_id = run_id.to_owned();
            inner.selection.task_id.clear();
        }
        self.notify(&StoreEvent::RunSelected(run_id.to_owned()));
    }

    pub fn select_task(&self, task_id: &str) {
        self.write().selection.task_id = task_id.to_owned();
        self.notify(&StoreEvent::TaskSelected(task_id.to_owned()));
    }

    /// Consistent copy of the selection triple.
    pub fn selection(&self) -> Selection {
        self.read().selection.clone()
    }

    // ── Active panel ─────────────────────────────────────────────────

    pub fn set_active_panel(&self, panel: Panel) {
        self.write().active_panel = panel;
        self.notify(&StoreEvent::PanelChanged(panel));
    }

    pub fn active_panel(&self) -> Panel {
        self.read().active_panel
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register `handler` for events of `kind`. Handlers run synchronously
    /// on the notifying thread, in registration order.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let mut inner = self.write();
        inner.next_subscription += 1;
        let id = SubscriptionId(inner.next_subscription);
        inner
            .subscribers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was already gone. A notify
    /// that snapshotted the list before this call may still invoke it once.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.write();
        for handlers in inner.subscribers.values_mut() {
            if let Some(pos) = handlers.iter().position(|(h, _)| *h == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    fn notify(&self, event: &StoreEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = {
            let inner = self.read();
            inner
                .subscribers
                .get(&kind)
                .map(|hs| hs.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };
        trace!(%kind, handlers = handlers.len(), "notify");
        for handler in handlers {
            handler(event);
        }
    }

    // ── Cache metadata ───────────────────────────────────────────────

    /// True if `key` was never refreshed or its last refresh is older than
    /// the TTL. Advisory only.
    pub fn needs_refresh(&self, key: &str) -> bool {
        self.read()
            .last_refresh
            .get(key)
            .is_none_or(|at| at.elapsed() > self.ttl)
    }

    /// Instant of the last successful refresh of `key`.
    pub fn last_refreshed(&self, key: &str) -> Option<Instant> {
        self.read().last_refresh.get(key).copied()
    }
}
