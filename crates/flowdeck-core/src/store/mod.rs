// ── Shared state store ──
//
// Latest known snapshot of remote entities plus the operator's selection,
// behind one reader/writer lock, with a synchronous listener registry.

mod event;
mod state_store;

pub use event::{EventKind, StoreEvent, SubscriptionId};
pub use state_store::{Selection, StateStore};

/// Cache key for the workflow collection.
pub const WORKFLOWS_KEY: &str = "workflows";
/// Cache key for the health snapshot.
pub const HEALTH_KEY: &str = "health";

/// Cache key for the runs of one workflow.
pub fn runs_key(workflow_id: &str) -> String {
    format!("runs:{workflow_id}")
}

/// Cache key for the task instances of one run.
pub fn tasks_key(workflow_id: &str, run_id: &str) -> String {
    format!("tasks:{workflow_id}/{run_id}")
}
