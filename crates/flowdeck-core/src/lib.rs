//! Live data layer between `flowdeck-api` and dashboard front ends.
//!
//! - **[`Dashboard`]**: session facade. [`start()`](Dashboard::start) spawns
//!   the workflow and health polls and wires selection changes to the runs
//!   and task-instance polls; the `select_*` helpers drive the drill-down
//!   and fetch once so a view fills without waiting a full interval.
//!
//! - **[`StateStore`]**: latest known snapshot of workflows, runs, task
//!   instances and health, plus the operator's selection and active panel,
//!   behind one `RwLock`. Listeners subscribe per [`EventKind`] and are
//!   invoked synchronously, outside the lock.
//!
//! - **[`Poller`]**: fixed loops that live as long as the session, and named
//!   loops that [`restart`](Poller::restart) replaces atomically. Everything
//!   hangs off one `CancellationToken`.
//!
//! - **[`Command`]**: validated writes (trigger, pause, backfill) executed
//!   through [`Dashboard::execute`].

pub mod command;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod poller;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{AuthCredentials, DEFAULT_CACHE_TTL, DashboardConfig, PollIntervals, TlsMode};
pub use dashboard::{Dashboard, RUNS_LOOP, TASKS_LOOP};
pub use error::CoreError;
pub use poller::Poller;
pub use store::{EventKind, Selection, StateStore, StoreEvent, SubscriptionId};

pub use model::{
    BackfillSummary, ComponentHealth, ConfigSection, Connection, HealthSnapshot, Panel, RunState,
    TaskDefinition, TaskInstance, TaskState, Variable, Workflow, WorkflowRun,
};
