// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lakegate_core::{DatasetKey, RelationshipCacheEntry};

use crate::gateway::{GatewayError, GatewayResult};

const ENTRY_FORMAT_VERSION: u32 = 1;

/// Persistence for per-dataset relationship graphs
pub trait RelationshipCacheStore: Send + Sync {
    fn load(&self, dataset: &DatasetKey) -> GatewayResult<Option<RelationshipCacheEntry>>;
    fn save(&self, dataset: &DatasetKey, entry: &RelationshipCacheEntry) -> GatewayResult<()>;
    /// Removes the entry entirely; missing entries are not an error
    fn delete(&self, dataset: &DatasetKey) -> GatewayResult<()>;
}

/// The on-disk format of one dataset's entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    version: u32,
    entry: RelationshipCacheEntry,
}

/// One JSON file per dataset, with an in-memory read-through cache
pub struct JsonFileRelationshipStore {
    data_dir: PathBuf,
    cache: RwLock<HashMap<DatasetKey, RelationshipCacheEntry>>,
}

impl JsonFileRelationshipStore {
    pub fn new(data_dir: PathBuf) -> Self {
        let _ = std::fs::create_dir_all(&data_dir);
        Self {
            data_dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn file_path(&self, dataset: &DatasetKey) -> PathBuf {
        self.data_dir.join(format!(
            "{}.{}.json",
            file_safe(&dataset.project_id),
            file_safe(&dataset.dataset_id)
        ))
    }
}

/// Escapes every byte outside `[A-Za-z0-9-]` as `_xx`, so distinct ids never
/// share a file.
fn file_safe(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

impl RelationshipCacheStore for JsonFileRelationshipStore {
    fn load(&self, dataset: &DatasetKey) -> GatewayResult<Option<RelationshipCacheEntry>> {
        if let Some(entry) = self.cache.read().get(dataset) {
            return Ok(Some(entry.clone()));
        }

        let path = self.file_path(dataset);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let stored: StoredEntry = serde_json::from_str(&content).map_err(|e| {
            GatewayError::storage(format!("Malformed relationship cache {:?}: {}", path, e))
        })?;
        if stored.entry.dataset_key != dataset.to_string() {
            warn!(
                "Relationship cache {:?} belongs to {}, not {}; ignoring it",
                path, stored.entry.dataset_key, dataset
            );
            return Ok(None);
        }
        debug!("Loaded relationship cache for {} from disk", dataset);

        self.cache.write().insert(dataset.clone(), stored.entry.clone());
        Ok(Some(stored.entry))
    }

    fn save(&self, dataset: &DatasetKey, entry: &RelationshipCacheEntry) -> GatewayResult<()> {
        let stored = StoredEntry {
            version: ENTRY_FORMAT_VERSION,
            entry: entry.clone(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.file_path(dataset), content)?;
        self.cache.write().insert(dataset.clone(), entry.clone());
        Ok(())
    }

    fn delete(&self, dataset: &DatasetKey) -> GatewayResult<()> {
        self.cache.write().remove(dataset);
        let path = self.file_path(dataset);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Non-persistent store for tests and single-run tools
#[derive(Default)]
pub struct InMemoryRelationshipStore {
    entries: RwLock<HashMap<DatasetKey, RelationshipCacheEntry>>,
}

impl InMemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelationshipCacheStore for InMemoryRelationshipStore {
    fn load(&self, dataset: &DatasetKey) -> GatewayResult<Option<RelationshipCacheEntry>> {
        Ok(self.entries.read().get(dataset).cloned())
    }

    fn save(&self, dataset: &DatasetKey, entry: &RelationshipCacheEntry) -> GatewayResult<()> {
        self.entries.write().insert(dataset.clone(), entry.clone());
        Ok(())
    }

    fn delete(&self, dataset: &DatasetKey) -> GatewayResult<()> {
        self.entries.write().remove(dataset);
        Ok(())
    }
}
