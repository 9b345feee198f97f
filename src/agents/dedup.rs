// SPDX-License-Identifier: Apache-2.0

//! Agent Dedup Cache
//!
//! Maps a canonical table set to one provisioned agent per process. Misses are
//! check-then-set: two concurrent first requests for the same set may both
//! provision unless per-key serialization is enabled. Failures are never
//! cached, so the next request retries.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use lakegate_core::{derive_cache_key_with_len, AgentHandle, TableReference};

use super::cache::AgentCacheStore;
use crate::gateway::AuthorityGateway;
use crate::metrics;

pub struct AgentDedupCache {
    gateway: Arc<AuthorityGateway>,
    store: Arc<dyn AgentCacheStore>,
    key_max_len: usize,
    /// Present only when provisioning is serialized per key. An entry lives
    /// until its key is provisioned; keys that keep failing stay in the map.
    key_locks: Option<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AgentDedupCache {
    pub fn new(
        gateway: Arc<AuthorityGateway>,
        store: Arc<dyn AgentCacheStore>,
        key_max_len: usize,
        serialize_provisioning: bool,
    ) -> Self {
        Self {
            gateway,
            store,
            key_max_len,
            key_locks: serialize_provisioning.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub fn cache_key(&self, refs: &[TableReference]) -> String {
        derive_cache_key_with_len(refs, self.key_max_len)
    }

    /// Returns the agent for this table set, provisioning it on first use.
    ///
    /// `None` means the caller should fall back to an inline context for this
    /// request only.
    #[instrument(skip(self, refs, system_instruction), fields(tables = refs.len()))]
    pub async fn get_or_create(
        &self,
        refs: &[TableReference],
        system_instruction: &str,
    ) -> Option<AgentHandle> {
        let cache_key = self.cache_key(refs);
        if let Some(handle) = self.store.get(&cache_key) {
            debug!("Agent cache hit for {}", cache_key);
            metrics::record_agent_cache(true);
            return Some(handle);
        }

        let Some(lock) = self.key_lock(&cache_key) else {
            return self.provision(cache_key, refs, system_instruction).await;
        };

        let _guard = lock.lock().await;
        if let Some(handle) = self.store.get(&cache_key) {
            debug!("Agent for {} provisioned while waiting", cache_key);
            metrics::record_agent_cache(true);
            return Some(handle);
        }
        let handle = self
            .provision(cache_key.clone(), refs, system_instruction)
            .await;
        if handle.is_some() {
            // later requests hit the store; waiters still hold their clone
            self.release_lock(&cache_key);
        }
        handle
    }

    fn key_lock(&self, cache_key: &str) -> Option<Arc<tokio::sync::Mutex<()>>> {
        let locks = self.key_locks.as_ref()?;
        let mut locks = locks.lock();
        Some(
            locks
                .entry(cache_key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone(),
        )
    }

    fn release_lock(&self, cache_key: &str) {
        if let Some(locks) = self.key_locks.as_ref() {
            locks.lock().remove(cache_key);
        }
    }

    #[cfg(test)]
    fn pending_locks(&self) -> usize {
        self.key_locks.as_ref().map_or(0, |locks| locks.lock().len())
    }

    async fn provision(
        &self,
        cache_key: String,
        refs: &[TableReference],
        system_instruction: &str,
    ) -> Option<AgentHandle> {
        metrics::record_agent_cache(false);
        let canonical: Vec<TableReference> = refs
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match self
            .gateway
            .create_or_fetch_agent(&cache_key, &canonical, system_instruction)
            .await
        {
            Some(handle) => {
                info!(
                    "Agent {} ready for {} tables",
                    handle.external_resource_name,
                    canonical.len()
                );
                self.store.insert(handle.clone());
                Some(handle)
            }
            None => {
                warn!("No agent for {}, caller falls back to inline context", cache_key);
                metrics::record_agent_provision_failure();
                None
            }
        }
    }

    pub fn cached_agents(&self) -> usize {
        self.store.len()
    }
}
