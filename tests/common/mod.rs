// SPDX-License-Identifier: Apache-2.0

//! Call-counting doubles of the remote services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use lakegate_core::{Column, DatasetKey, TableReference};
use lakegate_lib::agents::InMemoryAgentCache;
use lakegate_lib::annotation::{InMemoryRoleStore, RoleStore};
use lakegate_lib::config::AppConfig;
use lakegate_lib::gateway::{
    AgentClient, AuthorityClient, CatalogClient, CatalogEntry, GatewayError, GatewayResult,
    IamBinding, SearchScope,
};
use lakegate_lib::relations::{JsonFileRelationshipStore, RelationshipCacheStore};
use lakegate_lib::{AppState, Backends, SharedState};

pub const ADMIN_PROJECT: &str = "analytics";

#[derive(Default)]
pub struct FakeAuthority {
    pub project_bindings: Mutex<Vec<IamBinding>>,
    /// dataset id -> readers; `None` makes the lookup fail
    pub dataset_readers: Mutex<HashMap<String, Option<Vec<String>>>>,
    pub project_calls: AtomicUsize,
    pub dataset_calls: AtomicUsize,
}

impl FakeAuthority {
    pub fn grant_project(&self, role: &str, member: &str) {
        self.project_bindings
            .lock()
            .push(IamBinding::new(role, vec![member.to_string()]));
    }

    pub fn dataset(&self, dataset_id: &str, readers: Option<&[&str]>) {
        self.dataset_readers.lock().insert(
            dataset_id.to_string(),
            readers.map(|r| r.iter().map(|m| m.to_string()).collect()),
        );
    }
}

#[async_trait]
impl AuthorityClient for FakeAuthority {
    async fn get_project_iam_policy(&self, _project_id: &str) -> GatewayResult<Vec<IamBinding>> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.project_bindings.lock().clone())
    }

    async fn get_resource_iam_policy(&self, resource: &DatasetKey) -> GatewayResult<Vec<IamBinding>> {
        self.dataset_calls.fetch_add(1, Ordering::SeqCst);
        let readers = self.dataset_readers.lock().get(&resource.dataset_id).cloned();
        match readers {
            Some(Some(readers)) => Ok(vec![IamBinding::new("READER", readers)]),
            Some(None) => Err(GatewayError::Timeout),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub entries: Mutex<Vec<CatalogEntry>>,
    /// table id -> columns, all in one dataset
    pub tables: Mutex<Vec<(String, Vec<Column>)>>,
    pub schema_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn table(&self, name: &str, columns: &[(&str, &str)]) {
        self.tables.lock().push((
            name.to_string(),
            columns.iter().map(|(n, t)| Column::new(*n, *t)).collect(),
        ));
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn search_entries(
        &self,
        _query: &str,
        _scope: &SearchScope,
    ) -> GatewayResult<Vec<CatalogEntry>> {
        Ok(self.entries.lock().clone())
    }

    async fn list_tables(&self, _dataset: &DatasetKey) -> GatewayResult<Vec<String>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().iter().map(|(n, _)| n.clone()).collect())
    }

    async fn get_table_schema(&self, table: &TableReference) -> GatewayResult<Vec<Column>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .iter()
            .find(|(n, _)| n == &table.table_id)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| GatewayError::not_found(table.canonical()))
    }
}

#[derive(Default)]
pub struct FakeAgents {
    pub create_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub fail: AtomicBool,
    pub already_exists: AtomicBool,
    pub last_instruction: Mutex<Option<String>>,
}

#[async_trait]
impl AgentClient for FakeAgents {
    async fn create_agent(
        &self,
        agent_id: &str,
        _table_refs: &[TableReference],
        system_instruction: &str,
    ) -> GatewayResult<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_instruction.lock() = Some(system_instruction.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::status(503, "unavailable"));
        }
        if self.already_exists.load(Ordering::SeqCst) {
            return Err(GatewayError::conflict(agent_id));
        }
        Ok(agent_name(agent_id))
    }

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<String> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(agent_name(agent_id))
    }
}

pub fn agent_name(agent_id: &str) -> String {
    format!("projects/{}/locations/global/dataAgents/{}", ADMIN_PROJECT, agent_id)
}

pub struct Harness {
    pub state: SharedState,
    pub authority: Arc<FakeAuthority>,
    pub catalog: Arc<FakeCatalog>,
    pub agents: Arc<FakeAgents>,
    pub roles: Arc<InMemoryRoleStore>,
}

impl Harness {
    pub fn new(data_dir: &Path) -> Self {
        Self::with_fakes(
            data_dir,
            Arc::new(FakeAuthority::default()),
            Arc::new(FakeCatalog::default()),
            Arc::new(FakeAgents::default()),
            Arc::new(InMemoryRoleStore::new()),
        )
    }

    /// Rebuilds the state over the same doubles, as after a restart.
    pub fn restart(&self, data_dir: &Path) -> Self {
        Self::with_fakes(
            data_dir,
            self.authority.clone(),
            self.catalog.clone(),
            self.agents.clone(),
            self.roles.clone(),
        )
    }

    fn with_fakes(
        data_dir: &Path,
        authority: Arc<FakeAuthority>,
        catalog: Arc<FakeCatalog>,
        agents: Arc<FakeAgents>,
        roles: Arc<InMemoryRoleStore>,
    ) -> Self {
        let mut config = AppConfig::load_from(data_dir).expect("config");
        config.authority.admin_project = ADMIN_PROJECT.to_string();

        let relationships: Arc<dyn RelationshipCacheStore> =
            Arc::new(JsonFileRelationshipStore::new(config.relationships_dir()));
        let role_store: Arc<dyn RoleStore> = roles.clone();
        let backends = Backends {
            authority: authority.clone(),
            catalog: catalog.clone(),
            agents: agents.clone(),
            roles: role_store,
            relationships,
            agent_cache: Arc::new(InMemoryAgentCache::new()),
        };

        Self {
            state: Arc::new(AppState::with_backends(config, backends)),
            authority,
            catalog,
            agents,
            roles,
        }
    }
}
