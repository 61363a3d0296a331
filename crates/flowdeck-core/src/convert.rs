// ── API-to-domain type conversions ──
//
// Bridges raw `flowdeck_api::types` responses into `crate::model` domain
// types. Each `From` impl renames fields, parses state strings into enums,
// and parses heartbeat timestamps, dropping values that don't parse.

use chrono::{DateTime, Utc};

use flowdeck_api::types;

use crate::model::{
    BackfillSummary, ComponentHealth, ConfigSection, Connection, HealthSnapshot, RunState,
    TaskDefinition, TaskInstance, TaskState, Variable, Workflow, WorkflowRun,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 string, silently dropping unparseable values.
fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a wire collection into domain values.
pub(crate) fn collect<W, D: From<W>>(items: Vec<W>) -> Vec<D> {
    items.into_iter().map(D::from).collect()
}

// ── Workflows ──────────────────────────────────────────────────────

impl From<types::Dag> for Workflow {
    fn from(d: types::Dag) -> Self {
        Workflow {
            id: d.dag_id,
            display_name: d.dag_display_name,
            is_paused: d.is_paused,
            is_stale: d.is_stale,
            file_location: d.fileloc.or(d.relative_fileloc),
            owners: d.owners,
            description: d.description,
            schedule: d.timetable_description,
            tags: d.tags.into_iter().map(|t| t.name).collect(),
            max_active_runs: d.max_active_runs,
            max_active_tasks: d.max_active_tasks,
            has_import_errors: d.has_import_errors,
            last_parsed: d.last_parsed_time,
        }
    }
}

impl From<types::DagRun> for WorkflowRun {
    fn from(r: types::DagRun) -> Self {
        WorkflowRun {
            state: RunState::from_api(r.state.as_deref()),
            workflow_id: r.dag_id,
            run_id: r.dag_run_id,
            logical_date: r.logical_date,
            start_date: r.start_date,
            end_date: r.end_date,
            run_type: r.run_type,
            conf: r.conf.filter(|c| !c.is_null()),
            note: r.note,
        }
    }
}

// ── Tasks ──────────────────────────────────────────────────────────

impl From<types::Task> for TaskDefinition {
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(t: types::Task) -> Self {
        TaskDefinition {
            task_id: t.task_id,
            operator: t.operator_name,
            owner: t.owner,
            pool: t.pool,
            queue: t.queue,
            trigger_rule: t.trigger_rule,
            // Float on the wire; clamp before narrowing.
            retries: t.retries.map_or(0, |r| r.clamp(0.0, f64::from(u32::MAX)) as u32),
            upstream: t.upstream_task_ids,
            downstream: t.downstream_task_ids,
        }
    }
}

impl From<types::TaskInstance> for TaskInstance {
    fn from(t: types::TaskInstance) -> Self {
        TaskInstance {
            state: TaskState::from_api(t.state.as_deref()),
            task_id: t.task_id,
            display_name: t.task_display_name,
            workflow_id: t.dag_id,
            run_id: t.dag_run_id,
            start_date: t.start_date,
            end_date: t.end_date,
            duration_secs: t.duration,
            try_number: t.try_number,
            operator: t.operator_name,
            pool: t.pool,
            queue: t.queue,
            hostname: t.hostname,
        }
    }
}

// ── Cluster ────────────────────────────────────────────────────────

impl From<types::HealthStatus> for ComponentHealth {
    fn from(s: types::HealthStatus) -> Self {
        ComponentHealth {
            latest_heartbeat: parse_datetime(s.heartbeat()),
            status: s.status,
        }
    }
}

impl From<types::HealthInfo> for HealthSnapshot {
    fn from(h: types::HealthInfo) -> Self {
        HealthSnapshot {
            metadatabase: h.metadatabase.map(Into::into),
            scheduler: h.scheduler.map(Into::into),
            triggerer: h.triggerer.map(Into::into),
            dag_processor: h.dag_processor.map(Into::into),
        }
    }
}

impl From<types::Connection> for Connection {
    fn from(c: types::Connection) -> Self {
        Connection {
            id: c.connection_id,
            conn_type: c.conn_type,
            host: c.host,
            port: c.port,
            schema: c.schema,
            login: c.login,
        }
    }
}

impl From<types::Variable> for Variable {
    fn from(v: types::Variable) -> Self {
        Variable {
            key: v.key,
            value: v.value,
            description: v.description,
        }
    }
}

impl From<types::ConfigSection> for ConfigSection {
    fn from(s: types::ConfigSection) -> Self {
        ConfigSection {
            name: s.name,
            options: s.options.into_iter().map(|o| (o.key, o.value)).collect(),
        }
    }
}

impl From<types::BackfillResponse> for BackfillSummary {
    fn from(b: types::BackfillResponse) -> Self {
        BackfillSummary {
            id: b.id,
            workflow_id: b.dag_id,
            from_date: b.from_date,
            to_date: b.to_date,
            max_active_runs: b.max_active_runs,
            is_paused: b.is_paused,
            created_at: b.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dag_run_state_and_empty_conf() {
        let run: types::DagRun = serde_json::from_value(serde_json::json!({
            "dag_id": "etl",
            "dag_run_id": "scheduled__2025-03-01",
            "state": "failed",
            "conf": null
        }))
        .unwrap();
        let run = WorkflowRun::from(run);
        assert_eq!(run.state, RunState::Failed);
        assert_eq!(run.conf, None);
    }

    #[test]
    fn health_heartbeat_is_parsed() {
        let info: types::HealthInfo = serde_json::from_value(serde_json::json!({
            "scheduler": {
                "status": "healthy",
                "latest_scheduler_heartbeat": "2025-03-01T12:00:00+00:00"
            },
            "triggerer": { "status": null, "latest_triggerer_heartbeat": "garbage" }
        }))
        .unwrap();
        let health = HealthSnapshot::from(info);
        let scheduler = health.scheduler.unwrap();
        assert!(scheduler.is_healthy());
        assert_eq!(
            scheduler.latest_heartbeat,
            Some("2025-03-01T12:00:00Z".parse().unwrap())
        );
        assert_eq!(health.triggerer.unwrap().latest_heartbeat, None);
        assert!(health.metadatabase.is_none());
    }

    #[test]
    fn task_retries_are_clamped() {
        let task: types::Task = serde_json::from_value(serde_json::json!({
            "task_id": "load",
            "retries": 3.0,
            "upstream_task_ids": ["extract"]
        }))
        .unwrap();
        let task = TaskDefinition::from(task);
        assert_eq!(task.retries, 3);
        assert_eq!(task.upstream, vec!["extract".to_owned()]);
    }
}
