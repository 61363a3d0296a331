// DAG, run, task and log endpoints
//
// Path segments are caller-supplied ids, inserted verbatim. Airflow ids are
// restricted to URL-safe characters, so no escaping is applied.

use tracing::debug;

use crate::client::{FlowClient, ListOptions};
use crate::error::Error;
use crate::types::{
    BackfillRequest, BackfillResponse, DagCollection, DagPatch, DagRun, DagRunCollection,
    TaskCollection, TaskInstanceCollection, TaskLogResponse, TriggerDagRunRequest,
};

pub const DAGS_PATH: &str = "/api/v2/dags";
pub const BACKFILLS_PATH: &str = "/api/v2/backfills";

fn dag_path(dag_id: &str) -> String {
    format!("{DAGS_PATH}/{dag_id}")
}

fn runs_path(dag_id: &str) -> String {
    format!("{DAGS_PATH}/{dag_id}/dagRuns")
}

impl FlowClient {
    /// List DAGs.
    ///
    /// `GET /api/v2/dags`
    pub async fn list_dags(&self, opts: &ListOptions) -> Result<DagCollection, Error> {
        self.get(DAGS_PATH, Some(opts)).await
    }

    /// List runs of a DAG.
    ///
    /// `GET /api/v2/dags/{dag_id}/dagRuns`
    pub async fn list_dag_runs(
        &self,
        dag_id: &str,
        opts: &ListOptions,
    ) -> Result<DagRunCollection, Error> {
        self.get(&runs_path(dag_id), Some(opts)).await
    }

    /// Static task definitions of a DAG.
    ///
    /// `GET /api/v2/dags/{dag_id}/tasks`
    pub async fn list_tasks(&self, dag_id: &str) -> Result<TaskCollection, Error> {
        self.get(&format!("{DAGS_PATH}/{dag_id}/tasks"), None).await
    }

    /// Task instances of one run.
    ///
    /// `GET /api/v2/dags/{dag_id}/dagRuns/{run_id}/taskInstances`
    pub async fn list_task_instances(
        &self,
        dag_id: &str,
        run_id: &str,
        opts: &ListOptions,
    ) -> Result<TaskInstanceCollection, Error> {
        let path = format!("{}/{run_id}/taskInstances", runs_path(dag_id));
        self.get(&path, Some(opts)).await
    }

    /// Fetch a task attempt's log, rendered as text.
    ///
    /// `GET /api/v2/dags/{dag_id}/dagRuns/{run_id}/taskInstances/{task_id}/logs/{try}`
    ///
    /// A `try_number` of zero or less is treated as the first attempt.
    pub async fn task_logs(
        &self,
        dag_id: &str,
        run_id: &str,
        task_id: &str,
        try_number: i64,
    ) -> Result<String, Error> {
        let try_number = try_number.max(1);
        let path = format!(
            "{}/{run_id}/taskInstances/{task_id}/logs/{try_number}",
            runs_path(dag_id)
        );
        let resp: TaskLogResponse = self.get(&path, None).await?;
        Ok(resp.render())
    }

    /// Source file of a DAG as plain text.
    ///
    /// `GET /api/v2/dagSources/{dag_id}`
    pub async fn dag_source(&self, dag_id: &str) -> Result<String, Error> {
        self.get_text(&format!("/api/v2/dagSources/{dag_id}")).await
    }

    /// Trigger a new run.
    ///
    /// `POST /api/v2/dags/{dag_id}/dagRuns`
    pub async fn trigger_dag_run(
        &self,
        dag_id: &str,
        request: &TriggerDagRunRequest,
    ) -> Result<DagRun, Error> {
        debug!(dag_id, "triggering dag run");
        self.post(&runs_path(dag_id), request).await
    }

    /// Pause or unpause a DAG.
    ///
    /// `PATCH /api/v2/dags/{dag_id}` with `{"is_paused": ...}`
    pub async fn set_paused(&self, dag_id: &str, paused: bool) -> Result<(), Error> {
        debug!(dag_id, paused, "setting pause state");
        self.patch_no_content(&dag_path(dag_id), &DagPatch { is_paused: paused })
            .await
    }

    /// Create a backfill over a date range.
    ///
    /// `POST /api/v2/backfills`
    pub async fn create_backfill(
        &self,
        request: &BackfillRequest,
    ) -> Result<BackfillResponse, Error> {
        debug!(dag_id = %request.dag_id, "creating backfill");
        self.post(BACKFILLS_PATH, request).await
    }
}
