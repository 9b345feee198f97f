// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// A provisioned conversational agent bound to a fixed set of tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentHandle {
    /// Key derived from the table set the agent was provisioned for
    pub cache_key: String,
    /// Full resource name on the generative-analytics service
    pub external_resource_name: String,
}

impl AgentHandle {
    pub fn new(cache_key: impl Into<String>, external_resource_name: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            external_resource_name: external_resource_name.into(),
        }
    }
}
