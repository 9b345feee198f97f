//! Remote collaborator traits
//!
//! Every external service the core talks to sits behind one of these traits.
//! Production implementations live in `gateway::http`; tests supply doubles.

use async_trait::async_trait;

use lakegate_core::{Column, DatasetKey, TableReference};

use crate::gateway::error::GatewayResult;
use crate::gateway::types::{CatalogEntry, IamBinding, SearchScope};
use crate::observability::Sensitive;

/// Source of bearer tokens for outgoing calls
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> GatewayResult<Sensitive<String>>;
}

/// The service that owns IAM bindings
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    /// Project-level policy bindings
    async fn get_project_iam_policy(&self, project_id: &str) -> GatewayResult<Vec<IamBinding>>;

    /// Dataset-level policy bindings
    async fn get_resource_iam_policy(&self, resource: &DatasetKey)
        -> GatewayResult<Vec<IamBinding>>;
}

/// Metadata and schema provider
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_entries(
        &self,
        query: &str,
        scope: &SearchScope,
    ) -> GatewayResult<Vec<CatalogEntry>>;

    /// Table ids of a dataset
    async fn list_tables(&self, dataset: &DatasetKey) -> GatewayResult<Vec<String>>;

    async fn get_table_schema(&self, table: &TableReference) -> GatewayResult<Vec<Column>>;
}

/// Generative-analytics agent service
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Creates an agent and returns its resource name.
    ///
    /// Must report an existing agent with the same id as `GatewayError::Conflict`.
    async fn create_agent(
        &self,
        agent_id: &str,
        table_refs: &[TableReference],
        system_instruction: &str,
    ) -> GatewayResult<String>;

    /// Looks up an existing agent and returns its resource name.
    async fn get_agent(&self, agent_id: &str) -> GatewayResult<String>;
}
