// ── Domain model ──
//
// Canonical representation of orchestrator entities. Wire types from
// `flowdeck_api::types` are converted into these in `crate::convert`;
// the store, the poller callbacks and every front end only see these.

pub mod cluster;
pub mod panel;
pub mod task;
pub mod workflow;

// ── Re-exports ──────────────────────────────────────────────────────

pub use cluster::{
    BackfillSummary, ComponentHealth, ConfigSection, Connection, HealthSnapshot, Variable,
};
pub use panel::Panel;
pub use task::{TaskDefinition, TaskInstance, TaskState};
pub use workflow::{RunState, Workflow, WorkflowRun};
