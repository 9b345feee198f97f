// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::metrics;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub success: bool,
    pub metrics: Option<metrics::MetricsSnapshot>,
    pub cached_agents: usize,
    pub error: Option<String>,
}

/// Current counters plus the size of the agent cache.
pub async fn get_metrics(state: &SharedState) -> MetricsResponse {
    MetricsResponse {
        success: true,
        metrics: Some(metrics::snapshot()),
        cached_agents: state.agents.cached_agents(),
        error: None,
    }
}
