//! Response and request types for the Airflow 3 REST API (`/api/v2`).
//!
//! Field names match the JSON exactly (snake_case on the wire). Fields the
//! server may omit or null out are `Option` or `#[serde(default)]`, so a
//! partially populated object still decodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── DAGs ─────────────────────────────────────────────────────────────

/// DAG list, from `GET /api/v2/dags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagCollection {
    #[serde(default)]
    pub dags: Vec<Dag>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dag {
    pub dag_id: String,
    #[serde(default)]
    pub dag_display_name: Option<String>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub is_stale: bool,
    #[serde(default)]
    pub fileloc: Option<String>,
    #[serde(default)]
    pub relative_fileloc: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Human-readable schedule, e.g. "At 00:00".
    #[serde(default)]
    pub timetable_description: Option<String>,
    #[serde(default)]
    pub tags: Vec<DagTag>,
    #[serde(default)]
    pub last_parsed_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_active_tasks: Option<i64>,
    #[serde(default)]
    pub max_active_runs: Option<i64>,
    #[serde(default)]
    pub has_import_errors: bool,
    #[serde(default)]
    pub bundle_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagTag {
    pub name: String,
}

/// `PATCH /api/v2/dags/{dag_id}` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DagPatch {
    pub is_paused: bool,
}

// ── DAG runs ─────────────────────────────────────────────────────────

/// DAG run list, from `GET /api/v2/dags/{dag_id}/dagRuns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagRunCollection {
    #[serde(default)]
    pub dag_runs: Vec<DagRun>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagRun {
    pub dag_id: String,
    pub dag_run_id: String,
    /// One of: `queued`, `running`, `success`, `failed`.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub logical_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_type: Option<String>,
    #[serde(default)]
    pub conf: Option<Value>,
    #[serde(default)]
    pub note: Option<String>,
}

/// `POST /api/v2/dags/{dag_id}/dagRuns` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerDagRunRequest {
    /// `None` serializes as `null`, which asks the server to use "now".
    pub logical_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conf: Option<Value>,
}

// ── Tasks ────────────────────────────────────────────────────────────

/// Static task list, from `GET /api/v2/dags/{dag_id}/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCollection {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub downstream_task_ids: Vec<String>,
    #[serde(default)]
    pub upstream_task_ids: Vec<String>,
    #[serde(default)]
    pub trigger_rule: Option<String>,
    /// Sent as a float by some server versions.
    #[serde(default)]
    pub retries: Option<f64>,
}

// ── Task instances ───────────────────────────────────────────────────

/// Task instances of one run, from
/// `GET /api/v2/dags/{dag_id}/dagRuns/{run_id}/taskInstances`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstanceCollection {
    #[serde(default)]
    pub task_instances: Vec<TaskInstance>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub task_id: String,
    #[serde(default)]
    pub task_display_name: Option<String>,
    pub dag_id: String,
    pub dag_run_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub try_number: i64,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

// ── Logs ─────────────────────────────────────────────────────────────

/// Structured log response: `{"content": [{"event", "timestamp"}, ...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskLogResponse {
    #[serde(default)]
    pub content: Vec<LogLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl TaskLogResponse {
    /// Render as text: `"[timestamp] event\n"` per line, or just
    /// `"event\n"` when the line has no timestamp.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.content {
            if let Some(ts) = line.timestamp.as_deref().filter(|t| !t.is_empty()) {
                out.push('[');
                out.push_str(ts);
                out.push_str("] ");
            }
            out.push_str(&line.event);
            out.push('\n');
        }
        out
    }
}

// ── Health ───────────────────────────────────────────────────────────

/// Component health, from `GET /api/v2/monitor/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInfo {
    #[serde(default)]
    pub metadatabase: Option<HealthStatus>,
    #[serde(default)]
    pub scheduler: Option<HealthStatus>,
    #[serde(default)]
    pub triggerer: Option<HealthStatus>,
    #[serde(default)]
    pub dag_processor: Option<HealthStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latest_scheduler_heartbeat: Option<String>,
    #[serde(default)]
    pub latest_triggerer_heartbeat: Option<String>,
    #[serde(default)]
    pub latest_dag_processor_heartbeat: Option<String>,
}

impl HealthStatus {
    /// Whichever heartbeat field the component reports.
    pub fn heartbeat(&self) -> Option<&str> {
        self.latest_scheduler_heartbeat
            .as_deref()
            .or(self.latest_triggerer_heartbeat.as_deref())
            .or(self.latest_dag_processor_heartbeat.as_deref())
    }
}

// ── Configuration, connections, variables ────────────────────────────

/// Orchestrator configuration, from `GET /api/v2/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub sections: Vec<ConfigSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    pub name: String,
    #[serde(default)]
    pub options: Vec<ConfigOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOption {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCollection {
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: String,
    #[serde(default)]
    pub conn_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCollection {
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub total_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    /// Redacted by the server for sensitive keys.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Backfills ────────────────────────────────────────────────────────

/// `POST /api/v2/backfills` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillRequest {
    pub dag_id: String,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_active_runs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dag_run_conf: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub id: i64,
    pub dag_id: String,
    #[serde(default)]
    pub dag_display_name: Option<String>,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    #[serde(default)]
    pub dag_run_conf: Option<Value>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub reprocess_behavior: Option<String>,
    #[serde(default)]
    pub max_active_runs: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
