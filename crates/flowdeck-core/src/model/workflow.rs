// ── Workflow and run domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A schedulable workflow definition (a DAG).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub display_name: Option<String>,
    pub is_paused: bool,
    pub is_stale: bool,
    pub file_location: Option<String>,
    pub owners: Vec<String>,
    pub description: Option<String>,
    /// Human-readable timetable, e.g. "At 00:00".
    pub schedule: Option<String>,
    pub tags: Vec<String>,
    pub max_active_runs: Option<i64>,
    pub max_active_tasks: Option<i64>,
    pub has_import_errors: bool,
    pub last_parsed: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Display name, falling back to the id.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    /// Schedule description, or `-` when the workflow is unscheduled.
    pub fn schedule_label(&self) -> &str {
        self.schedule
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("-")
    }
}

/// Run lifecycle state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum RunState {
    Queued,
    Running,
    Success,
    Failed,
    Unknown,
}

impl RunState {
    /// Parse the wire value; anything unrecognized becomes `Unknown`.
    pub fn from_api(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or(Self::Unknown)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// One execution of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub workflow_id: String,
    pub run_id: String,
    pub state: RunState,
    pub logical_date: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub run_type: Option<String>,
    pub conf: Option<Value>,
    pub note: Option<String>,
}

impl WorkflowRun {
    /// Elapsed run time. Runs still in flight are measured up to `now`;
    /// runs that never started have no duration.
    pub fn duration(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let start = self.start_date?;
        Some(self.end_date.unwrap_or(now) - start)
    }
}
