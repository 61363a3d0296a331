// ── Command API ──
//
// Every write against the orchestrator is a `Command`. The dashboard
// validates it, routes it to the matching client call, and reports the
// outcome as a `CommandResult`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{BackfillSummary, WorkflowRun};

/// All write operations against an orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Runs ─────────────────────────────────────────────────────────
    /// `logical_date: None` lets the server use "now". An empty or `{}`
    /// conf is not sent.
    TriggerRun {
        workflow_id: String,
        logical_date: Option<DateTime<Utc>>,
        conf: Option<Value>,
    },

    // ── Scheduling ───────────────────────────────────────────────────
    SetPaused {
        workflow_id: String,
        paused: bool,
    },
    /// Flip the pause flag, reading the current value from the cache.
    TogglePause { workflow_id: String },

    // ── Backfills ────────────────────────────────────────────────────
    CreateBackfill {
        workflow_id: String,
        from_date: DateTime<Utc>,
        to_date: DateTime<Utc>,
        /// Sent only when greater than zero.
        max_active_runs: u32,
        run_conf: Option<Value>,
    },
}

impl Command {
    /// Workflow the command acts on.
    pub fn workflow_id(&self) -> &str {
        match self {
            Self::TriggerRun { workflow_id, .. }
            | Self::SetPaused { workflow_id, .. }
            | Self::TogglePause { workflow_id }
            | Self::CreateBackfill { workflow_id, .. } => workflow_id,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.workflow_id().trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "workflow id must not be empty".into(),
            });
        }
        if let Self::CreateBackfill {
            from_date, to_date, ..
        } = self
        {
            if from_date > to_date {
                return Err(CoreError::ValidationFailed {
                    message: format!("backfill start {from_date} is after end {to_date}"),
                });
            }
        }
        Ok(())
    }
}

/// Outcome of a successfully executed [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Triggered(WorkflowRun),
    /// The pause flag the workflow now has.
    PauseSet { paused: bool },
    Backfill(BackfillSummary),
}

/// Drop a conf that carries nothing: `null`, `{}`, or an empty string.
pub(crate) fn effective_conf(conf: Option<Value>) -> Option<Value> {
    conf.filter(|c| match c {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.trim().is_empty() && s.trim() != "{}",
        _ => true,
    })
}
