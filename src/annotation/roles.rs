// SPDX-License-Identifier: Apache-2.0

//! Application role store consulted by the admin tier.

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lakegate_core::Principal;

use crate::gateway::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
    Viewer,
}

impl AppRole {
    pub fn is_elevated(&self) -> bool {
        matches!(self, AppRole::Admin)
    }
}

/// Trait for the application role backend
pub trait RoleStore: Send + Sync {
    /// `Ok(None)` when the principal has no recorded role
    fn role_for(&self, principal: &Principal) -> GatewayResult<Option<AppRole>>;
    fn set_role(&self, principal: &Principal, role: AppRole) -> GatewayResult<()>;
    fn remove_role(&self, principal: &Principal) -> GatewayResult<()>;
}

fn role_key(principal: &Principal) -> String {
    principal.email.to_lowercase()
}

/// On-disk format of the role file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RolesFile {
    version: u32,
    roles: HashMap<String, AppRole>,
}

impl Default for RolesFile {
    fn default() -> Self {
        Self {
            version: 1,
            roles: HashMap::new(),
        }
    }
}

/// Role store persisted as a single JSON file, loaded lazily
pub struct JsonFileRoleStore {
    path: PathBuf,
    cache: RwLock<Option<RolesFile>>,
}

impl JsonFileRoleStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
        }
    }

    fn load(&self) -> GatewayResult<RolesFile> {
        if let Some(file) = self.cache.read().as_ref() {
            return Ok(file.clone());
        }
        let file = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            serde_json::from_str(&content).map_err(|e| {
                GatewayError::storage(format!("Malformed role file {:?}: {}", self.path, e))
            })?
        } else {
            debug!("No role file at {:?}", self.path);
            RolesFile::default()
        };
        *self.cache.write() = Some(file.clone());
        Ok(file)
    }

    fn save(&self, file: RolesFile) -> GatewayResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, content)?;
        *self.cache.write() = Some(file);
        Ok(())
    }
}

impl RoleStore for JsonFileRoleStore {
    fn role_for(&self, principal: &Principal) -> GatewayResult<Option<AppRole>> {
        Ok(self.load()?.roles.get(&role_key(principal)).copied())
    }

    fn set_role(&self, principal: &Principal, role: AppRole) -> GatewayResult<()> {
        let mut file = self.load()?;
        file.roles.insert(role_key(principal), role);
        self.save(file)
    }

    fn remove_role(&self, principal: &Principal) -> GatewayResult<()> {
        let mut file = self.load()?;
        if file.roles.remove(&role_key(principal)).is_some() {
            self.save(file)?;
        }
        Ok(())
    }
}

/// Role store for tests and ephemeral deployments
#[derive(Default)]
pub struct InMemoryRoleStore {
    roles: RwLock<HashMap<String, AppRole>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStore for InMemoryRoleStore {
    fn role_for(&self, principal: &Principal) -> GatewayResult<Option<AppRole>> {
        Ok(self.roles.read().get(&role_key(principal)).copied())
    }

    fn set_role(&self, principal: &Principal, role: AppRole) -> GatewayResult<()> {
        self.roles.write().insert(role_key(principal), role);
        Ok(())
    }

    fn remove_role(&self, principal: &Principal) -> GatewayResult<()> {
        self.roles.write().remove(&role_key(principal));
        Ok(())
    }
}
