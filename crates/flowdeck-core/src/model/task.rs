// ── Task domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static definition of one step in a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub task_id: String,
    pub operator: Option<String>,
    pub owner: Option<String>,
    pub pool: Option<String>,
    pub queue: Option<String>,
    pub trigger_rule: Option<String>,
    pub retries: u32,
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
}

/// Task instance state, as reported by the orchestrator.
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
pub enum TaskState {
    Scheduled,
    Queued,
    Running,
    Success,
    Failed,
    UpForRetry,
    UpForReschedule,
    UpstreamFailed,
    Skipped,
    Removed,
    Restarting,
    Deferred,
    /// Not yet scheduled (`null` on the wire).
    NoStatus,
    Unknown,
}

impl TaskState {
    pub fn from_api(raw: Option<&str>) -> Self {
        match raw {
            None | Some("" | "none") => Self::NoStatus,
            Some(s) => s.parse().unwrap_or(Self::Unknown),
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::UpstreamFailed | Self::Skipped | Self::Removed
        )
    }
}

/// One attempt of one task within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub task_id: String,
    pub display_name: Option<String>,
    pub workflow_id: String,
    pub run_id: String,
    pub state: TaskState,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Seconds, as reported by the server.
    pub duration_secs: Option<f64>,
    pub try_number: i64,
    pub operator: Option<String>,
    pub pool: Option<String>,
    pub queue: Option<String>,
    pub hostname: Option<String>,
}

impl TaskInstance {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.task_id)
    }
}
