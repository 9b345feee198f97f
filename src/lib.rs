// Lakegate - permission-aware catalog services
// Core library

pub mod agents;
pub mod annotation;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod observability;
pub mod relations;

use std::sync::Arc;

use tracing::info;

use agents::{AgentCacheStore, AgentDedupCache, InMemoryAgentCache};
use annotation::{AccessAnnotator, JsonFileRoleStore, RoleStore};
use config::AppConfig;
use gateway::http::{
    build_client, HttpAgentClient, HttpAuthorityClient, HttpCatalogClient, StaticTokenProvider,
};
use gateway::{AgentClient, AuthorityClient, AuthorityGateway, CatalogClient, GatewayResult};
use relations::{JsonFileRelationshipStore, RelationshipCacheStore, RelationshipService};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub gateway: Arc<AuthorityGateway>,
    pub annotator: Arc<AccessAnnotator>,
    pub relationships: Arc<RelationshipService>,
    pub agents: Arc<AgentDedupCache>,
}

/// Remote clients and stores the services are wired onto
pub struct Backends {
    pub authority: Arc<dyn AuthorityClient>,
    pub catalog: Arc<dyn CatalogClient>,
    pub agents: Arc<dyn AgentClient>,
    pub roles: Arc<dyn RoleStore>,
    pub relationships: Arc<dyn RelationshipCacheStore>,
    pub agent_cache: Arc<dyn AgentCacheStore>,
}

impl AppState {
    /// Wires the HTTP clients and on-disk stores described by `config`.
    pub fn new(config: AppConfig) -> GatewayResult<Self> {
        let client = build_client(config.http.request_timeout())?;
        let tokens = Arc::new(StaticTokenProvider::new(config.access_token.clone()));
        let endpoints = &config.endpoints;

        let backends = Backends {
            authority: Arc::new(HttpAuthorityClient::new(
                client.clone(),
                tokens.clone(),
                &endpoints.resource_manager_url,
                &endpoints.bigquery_url,
            )),
            catalog: Arc::new(HttpCatalogClient::new(
                client.clone(),
                tokens.clone(),
                &endpoints.catalog_url,
                &endpoints.bigquery_url,
            )),
            agents: Arc::new(HttpAgentClient::new(
                client,
                tokens,
                &endpoints.agent_url,
                config.agent_project(),
                &endpoints.agent_location,
            )),
            roles: Arc::new(JsonFileRoleStore::new(config.roles_file())),
            relationships: Arc::new(JsonFileRelationshipStore::new(config.relationships_dir())),
            agent_cache: Arc::new(InMemoryAgentCache::new()),
        };

        info!(
            "Service state initialized (admin project: {:?}, data dir: {:?})",
            config.authority.admin_project, config.data_dir
        );
        Ok(Self::with_backends(config, backends))
    }

    pub fn with_backends(config: AppConfig, backends: Backends) -> Self {
        let gateway = Arc::new(AuthorityGateway::new(
            backends.authority,
            backends.catalog,
            backends.agents,
        ));
        let annotator = Arc::new(AccessAnnotator::new(
            Arc::clone(&gateway),
            backends.roles,
            config.authority.clone(),
        ));
        let relationships = Arc::new(RelationshipService::new(
            Arc::clone(&gateway),
            backends.relationships,
        ));
        let agents = Arc::new(AgentDedupCache::new(
            Arc::clone(&gateway),
            backends.agent_cache,
            config.cache.key_max_len,
            config.cache.serialize_agent_provisioning,
        ));

        Self {
            config,
            gateway,
            annotator,
            relationships,
            agents,
        }
    }
}

/// Loads configuration, installs logging and builds the shared state.
pub fn bootstrap() -> GatewayResult<SharedState> {
    let config = AppConfig::load()?;
    observability::init_tracing(&config.log_dir());
    Ok(Arc::new(AppState::new(config)?))
}
