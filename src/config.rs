// SPDX-License-Identifier: Apache-2.0

//! Service configuration
//!
//! Read from `<data_dir>/lakegate.json` when present, then overridden by
//! environment variables. Every field has a default so a missing file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lakegate_core::DEFAULT_MAX_KEY_LEN;

use crate::gateway::{GatewayError, GatewayResult};
use crate::observability::Sensitive;

const CONFIG_FILE: &str = "lakegate.json";

const ENV_DATA_DIR: &str = "LAKEGATE_DATA_DIR";
const ENV_ADMIN_PROJECT: &str = "LAKEGATE_ADMIN_PROJECT";
const ENV_ACCESS_TOKEN: &str = "LAKEGATE_ACCESS_TOKEN";
const ENV_AGENT_LOCATION: &str = "LAKEGATE_AGENT_LOCATION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for persisted state (relationship cache, role store, logs)
    pub data_dir: PathBuf,
    pub authority: AuthorityConfig,
    pub endpoints: EndpointConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    /// Bearer token for outgoing calls; only ever taken from the environment
    #[serde(skip)]
    pub access_token: Option<Sensitive<String>>,
}

/// Roles and project used by the permission cascade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Project whose IAM policy decides the admin and project tiers
    pub admin_project: String,
    /// Project roles that grant access to everything ("reader or above")
    pub reader_roles: Vec<String>,
    /// Project roles that count as elevated
    pub admin_roles: Vec<String>,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            admin_project: String::new(),
            reader_roles: vec![
                "roles/owner".to_string(),
                "roles/editor".to_string(),
                "roles/viewer".to_string(),
                "roles/bigquery.admin".to_string(),
                "roles/bigquery.dataOwner".to_string(),
                "roles/bigquery.dataEditor".to_string(),
                "roles/bigquery.dataViewer".to_string(),
            ],
            admin_roles: vec![
                "roles/owner".to_string(),
                "roles/bigquery.admin".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub resource_manager_url: String,
    pub bigquery_url: String,
    pub catalog_url: String,
    pub agent_url: String,
    /// Project that owns provisioned agents; falls back to the admin project
    pub agent_project: Option<String>,
    pub agent_location: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            resource_manager_url: "https://cloudresourcemanager.googleapis.com".to_string(),
            bigquery_url: "https://bigquery.googleapis.com".to_string(),
            catalog_url: "https://datacatalog.googleapis.com".to_string(),
            agent_url: "https://geminidataanalytics.googleapis.com".to_string(),
            agent_project: None,
            agent_location: "global".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum length of derived agent cache keys
    pub key_max_len: usize,
    /// Serialize provisioning per cache key instead of tolerating duplicate misses
    pub serialize_agent_provisioning: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_max_len: DEFAULT_MAX_KEY_LEN,
            serialize_agent_provisioning: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            authority: AuthorityConfig::default(),
            endpoints: EndpointConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            access_token: None,
        }
    }
}

impl AppConfig {
    /// Loads from the default (or `LAKEGATE_DATA_DIR`) data directory.
    pub fn load() -> GatewayResult<Self> {
        let data_dir = std::env::var_os(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let mut config = Self::load_from(&data_dir)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads `<data_dir>/lakegate.json` without consulting the environment.
    pub fn load_from(data_dir: &Path) -> GatewayResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                GatewayError::config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config: AppConfig = serde_json::from_str(&content).map_err(|e| {
                GatewayError::config(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            info!("Loaded configuration from {:?}", path);
            config
        } else {
            debug!("No config file at {:?}, using defaults", path);
            AppConfig::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn save(&self) -> GatewayResult<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        debug!("Saved configuration to {:?}", path);
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(project) = std::env::var(ENV_ADMIN_PROJECT) {
            self.authority.admin_project = project;
        }
        if let Ok(location) = std::env::var(ENV_AGENT_LOCATION) {
            self.endpoints.agent_location = location;
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            if !token.is_empty() {
                self.access_token = Some(Sensitive::new(token));
            }
        }
    }

    pub fn relationships_dir(&self) -> PathBuf {
        self.data_dir.join("relationships")
    }

    pub fn roles_file(&self) -> PathBuf {
        self.data_dir.join("roles.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn agent_project(&self) -> &str {
        self.endpoints
            .agent_project
            .as_deref()
            .unwrap_or(&self.authority.admin_project)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lakegate")
}
