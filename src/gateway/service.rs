// SPDX-License-Identifier: Apache-2.0

//! Authority Gateway
//!
//! Wraps the remote clients with the failure semantics the services rely on:
//! membership checks fail closed, schema fetches tolerate partial failure and
//! agent provisioning recovers from conflicts. Nothing here returns an error
//! to its caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use lakegate_core::{AgentHandle, DatasetKey, Principal, Table, TableReference};

use crate::gateway::error::GatewayResult;
use crate::gateway::traits::{AgentClient, AuthorityClient, CatalogClient};
use crate::gateway::types::{CatalogEntry, SearchScope};
use crate::metrics;

const AGENT_ID_PREFIX: &str = "agent_";

pub struct AuthorityGateway {
    authority: Arc<dyn AuthorityClient>,
    catalog: Arc<dyn CatalogClient>,
    agents: Arc<dyn AgentClient>,
}

impl AuthorityGateway {
    pub fn new(
        authority: Arc<dyn AuthorityClient>,
        catalog: Arc<dyn CatalogClient>,
        agents: Arc<dyn AgentClient>,
    ) -> Self {
        Self {
            authority,
            catalog,
            agents,
        }
    }

    /// True if the principal holds any of `roles` on the project.
    ///
    /// One policy call. Transport failures are logged and read as `false`.
    pub async fn check_project_membership(
        &self,
        principal: &Principal,
        project_id: &str,
        roles: &[String],
    ) -> bool {
        let held = self.project_roles(principal, project_id).await;
        roles.iter().any(|r| held.contains(r))
    }

    /// Every project role whose binding includes the principal.
    ///
    /// One policy call; empty when the lookup fails.
    #[instrument(skip(self, principal), fields(project = %project_id))]
    pub async fn project_roles(&self, principal: &Principal, project_id: &str) -> HashSet<String> {
        match self.authority.get_project_iam_policy(project_id).await {
            Ok(bindings) => bindings
                .into_iter()
                .filter(|b| b.includes(principal))
                .map(|b| b.role)
                .collect(),
            Err(e) => {
                warn!("Project policy lookup failed for {}: {}", project_id, e);
                HashSet::new()
            }
        }
    }

    /// Dataset-scoped membership check, raw result.
    async fn try_resource_membership(
        &self,
        principal: &Principal,
        resource: &DatasetKey,
    ) -> GatewayResult<bool> {
        let bindings = self.authority.get_resource_iam_policy(resource).await?;
        Ok(bindings.iter().any(|b| b.includes(principal)))
    }

    /// True if the principal is bound to the dataset under any role.
    pub async fn check_resource_membership(
        &self,
        principal: &Principal,
        resource: &DatasetKey,
    ) -> bool {
        match self.try_resource_membership(principal, resource).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!("Dataset policy lookup failed for {}: {}", resource, e);
                metrics::record_dataset_check_failure();
                false
            }
        }
    }

    /// Checks every dataset concurrently. Each check resolves on its own, so a
    /// failing dataset only denies itself.
    #[instrument(skip(self, principal, resources), fields(datasets = resources.len()))]
    pub async fn check_resource_memberships(
        &self,
        principal: &Principal,
        resources: &[DatasetKey],
    ) -> HashMap<DatasetKey, bool> {
        let checks = resources.iter().map(|resource| async move {
            metrics::record_dataset_check();
            let verdict = self.check_resource_membership(principal, resource).await;
            (resource.clone(), verdict)
        });
        join_all(checks).await.into_iter().collect()
    }

    /// Lists the dataset and describes every table concurrently.
    ///
    /// Tables whose schema cannot be fetched are left out. A failed listing
    /// yields an empty snapshot.
    #[instrument(skip(self), fields(dataset = %dataset))]
    pub async fn fetch_schema(&self, dataset: &DatasetKey) -> Vec<Table> {
        let table_ids = match self.catalog.list_tables(dataset).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to list tables of {}: {}", dataset, e);
                return Vec::new();
            }
        };

        let describes = table_ids.into_iter().map(|table_id| async move {
            let reference = dataset.table(&table_id);
            let result = self.catalog.get_table_schema(&reference).await;
            (table_id, result)
        });

        join_all(describes)
            .await
            .into_iter()
            .filter_map(|(table_id, result)| match result {
                Ok(columns) => Some(Table::new(table_id, columns)),
                Err(e) => {
                    debug!("Dropping table {} from snapshot: {}", table_id, e);
                    None
                }
            })
            .collect()
    }

    /// Catalog search that degrades to no results.
    pub async fn search_entries(&self, query: &str, scope: &SearchScope) -> Vec<CatalogEntry> {
        match self.catalog.search_entries(query, scope).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Catalog search failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Creates the agent for `cache_key`, or fetches it when it already exists.
    ///
    /// Returns `None` on any other failure.
    #[instrument(skip(self, table_refs, system_instruction), fields(tables = table_refs.len()))]
    pub async fn create_or_fetch_agent(
        &self,
        cache_key: &str,
        table_refs: &[TableReference],
        system_instruction: &str,
    ) -> Option<AgentHandle> {
        let agent_id = agent_id_for(cache_key);
        match self
            .agents
            .create_agent(&agent_id, table_refs, system_instruction)
            .await
        {
            Ok(name) => Some(AgentHandle::new(cache_key, name)),
            Err(e) if e.is_conflict() => {
                debug!("Agent {} already exists, fetching it", agent_id);
                match self.agents.get_agent(&agent_id).await {
                    Ok(name) => Some(AgentHandle::new(cache_key, name)),
                    Err(e) => {
                        warn!("Failed to fetch existing agent {}: {}", agent_id, e);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("Failed to create agent {}: {}", agent_id, e);
                None
            }
        }
    }
}

/// Remote agent id for a cache key (ids must start with a letter)
pub fn agent_id_for(cache_key: &str) -> String {
    format!("{}{}", AGENT_ID_PREFIX, cache_key)
}
