// ── Cluster-level domain types ──
//
// Health, configuration, connections, variables and backfills. None of
// these are polled per selection; they are fetched on startup or demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of one orchestrator component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: Option<String>,
    pub latest_heartbeat: Option<DateTime<Utc>>,
}

impl ComponentHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.as_deref() == Some("healthy")
    }
}

/// Point-in-time health of the orchestrator. A component the server did
/// not report is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub metadatabase: Option<ComponentHealth>,
    pub scheduler: Option<ComponentHealth>,
    pub triggerer: Option<ComponentHealth>,
    pub dag_processor: Option<ComponentHealth>,
}

impl HealthSnapshot {
    /// Components in display order, paired with their label.
    pub fn components(&self) -> [(&'static str, Option<&ComponentHealth>); 4] {
        [
            ("metadatabase", self.metadatabase.as_ref()),
            ("scheduler", self.scheduler.as_ref()),
            ("triggerer", self.triggerer.as_ref()),
            ("dag_processor", self.dag_processor.as_ref()),
        ]
    }

    /// True when every reported component is healthy.
    pub fn all_healthy(&self) -> bool {
        self.components()
            .iter()
            .filter_map(|(_, c)| *c)
            .all(ComponentHealth::is_healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub conn_type: Option<String>,
    pub host: Option<String>,
    pub port: Option<i64>,
    pub schema: Option<String>,
    pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
}

/// One `[section]` of the orchestrator's own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    pub name: String,
    pub options: Vec<(String, String)>,
}

/// Result of creating a backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub id: i64,
    pub workflow_id: String,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub max_active_runs: Option<i64>,
    pub is_paused: bool,
    pub created_at: Option<DateTime<Utc>>,
}
