// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use parking_lot::RwLock;

use lakegate_core::AgentHandle;

/// Storage behind the agent dedup cache.
///
/// The in-memory map is process-lifetime and unbounded. A bounded or shared
/// implementation can be dropped in without touching callers.
pub trait AgentCacheStore: Send + Sync {
    fn get(&self, cache_key: &str) -> Option<AgentHandle>;
    fn insert(&self, handle: AgentHandle);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct InMemoryAgentCache {
    handles: RwLock<HashMap<String, AgentHandle>>,
}

impl InMemoryAgentCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentCacheStore for InMemoryAgentCache {
    fn get(&self, cache_key: &str) -> Option<AgentHandle> {
        self.handles.read().get(cache_key).cloned()
    }

    fn insert(&self, handle: AgentHandle) {
        self.handles.write().insert(handle.cache_key.clone(), handle);
    }

    fn len(&self) -> usize {
        self.handles.read().len()
    }
}
