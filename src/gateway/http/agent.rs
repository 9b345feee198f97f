// SPDX-License-Identifier: Apache-2.0

//! Generative-analytics agent provisioning over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use lakegate_core::TableReference;

use super::{encode_segment, json_body};
use crate::gateway::error::GatewayResult;
use crate::gateway::traits::{AccessTokenProvider, AgentClient};

pub struct HttpAgentClient {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
    project_id: String,
    location: String,
}

impl HttpAgentClient {
    pub fn new(
        client: Client,
        tokens: Arc<dyn AccessTokenProvider>,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            base_url: base_url.into(),
            project_id: project_id.into(),
            location: location.into(),
        }
    }

    fn parent(&self) -> String {
        format!(
            "projects/{}/locations/{}",
            encode_segment(&self.project_id),
            encode_segment(&self.location)
        )
    }

    fn resource_name(&self, agent_id: &str) -> String {
        format!("{}/dataAgents/{}", self.parent(), encode_segment(agent_id))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn create_agent(
        &self,
        agent_id: &str,
        table_refs: &[TableReference],
        system_instruction: &str,
    ) -> GatewayResult<String> {
        let token = self.tokens.access_token().await?;
        let url = self.url(&format!("{}/dataAgents", self.parent()));
        let body = agent_body(table_refs, system_instruction);
        debug!("Creating agent {} over {} tables", agent_id, table_refs.len());

        let response = self
            .client
            .post(&url)
            .query(&[("dataAgentId", agent_id)])
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await?;
        // Creation returns a long-running operation; the agent name is deterministic.
        json_body(response, agent_id).await?;
        Ok(self.resource_name(agent_id))
    }

    async fn get_agent(&self, agent_id: &str) -> GatewayResult<String> {
        let token = self.tokens.access_token().await?;
        let name = self.resource_name(agent_id);
        let response = self
            .client
            .get(self.url(&name))
            .bearer_auth(token.expose())
            .send()
            .await?;
        let body = json_body(response, agent_id).await?;
        Ok(body["name"].as_str().map(String::from).unwrap_or(name))
    }
}

pub(crate) fn agent_body(table_refs: &[TableReference], system_instruction: &str) -> Value {
    let references: Vec<Value> = table_refs
        .iter()
        .map(|r| {
            json!({
                "projectId": r.project_id,
                "datasetId": r.dataset_id,
                "tableId": r.table_id,
            })
        })
        .collect();

    json!({
        "dataAnalyticsAgent": {
            "publishedContext": {
                "systemInstruction": system_instruction,
                "datasourceReferences": {
                    "bq": { "tableReferences": references }
                }
            }
        }
    })
}
