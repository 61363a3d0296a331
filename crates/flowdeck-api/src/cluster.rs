// Cluster-level endpoints: health, configuration, connections, variables

use crate::client::{FlowClient, ListOptions};
use crate::error::Error;
use crate::types::{ConfigResponse, ConnectionCollection, HealthInfo, VariableCollection};

impl FlowClient {
    /// Component health.
    ///
    /// `GET /api/v2/monitor/health`
    pub async fn health(&self) -> Result<HealthInfo, Error> {
        self.get("/api/v2/monitor/health", None).await
    }

    /// Orchestrator configuration sections. Usually 403 unless the server
    /// exposes its config.
    ///
    /// `GET /api/v2/config`
    pub async fn config(&self) -> Result<ConfigResponse, Error> {
        self.get("/api/v2/config", None).await
    }

    /// `GET /api/v2/connections`
    pub async fn list_connections(
        &self,
        opts: &ListOptions,
    ) -> Result<ConnectionCollection, Error> {
        self.get("/api/v2/connections", Some(opts)).await
    }

    /// `GET /api/v2/variables`
    pub async fn list_variables(&self, opts: &ListOptions) -> Result<VariableCollection, Error> {
        self.get("/api/v2/variables", Some(opts)).await
    }
}
