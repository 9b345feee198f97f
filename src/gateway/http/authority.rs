// SPDX-License-Identifier: Apache-2.0

//! IAM policy lookups over HTTP
//!
//! Project policies come from the resource manager `getIamPolicy` call.
//! Dataset policies are read from the dataset's access entries and folded
//! into role bindings.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use lakegate_core::DatasetKey;

use super::{encode_segment, json_body};
use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::traits::{AccessTokenProvider, AuthorityClient};
use crate::gateway::types::IamBinding;

pub struct HttpAuthorityClient {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
    resource_manager_url: String,
    bigquery_url: String,
}

impl HttpAuthorityClient {
    pub fn new(
        client: Client,
        tokens: Arc<dyn AccessTokenProvider>,
        resource_manager_url: impl Into<String>,
        bigquery_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            resource_manager_url: resource_manager_url.into(),
            bigquery_url: bigquery_url.into(),
        }
    }
}

#[async_trait]
impl AuthorityClient for HttpAuthorityClient {
    async fn get_project_iam_policy(&self, project_id: &str) -> GatewayResult<Vec<IamBinding>> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/v1/projects/{}:getIamPolicy",
            self.resource_manager_url.trim_end_matches('/'),
            encode_segment(project_id)
        );
        debug!("Fetching project policy: {}", project_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .json(&json!({ "options": { "requestedPolicyVersion": 3 } }))
            .send()
            .await?;
        let body = json_body(response, project_id).await?;
        bindings_from_policy(&body)
    }

    async fn get_resource_iam_policy(
        &self,
        resource: &DatasetKey,
    ) -> GatewayResult<Vec<IamBinding>> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/bigquery/v2/projects/{}/datasets/{}",
            self.bigquery_url.trim_end_matches('/'),
            encode_segment(&resource.project_id),
            encode_segment(&resource.dataset_id)
        );
        debug!("Fetching dataset access entries: {}", resource);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await?;
        let body = json_body(response, &resource.to_string()).await?;
        Ok(bindings_from_dataset_access(&body))
    }
}

/// Parses a `Policy` payload. A policy without bindings is valid and empty.
pub(crate) fn bindings_from_policy(body: &Value) -> GatewayResult<Vec<IamBinding>> {
    match body.get("bindings") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(bindings) => serde_json::from_value(bindings.clone())
            .map_err(|e| GatewayError::invalid_response(format!("Malformed policy: {}", e))),
    }
}

/// Folds dataset access entries into one binding per role.
///
/// Entries that name a view, routine or dataset instead of a member are skipped.
pub(crate) fn bindings_from_dataset_access(body: &Value) -> Vec<IamBinding> {
    let mut by_role: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let entries = body["access"].as_array().cloned().unwrap_or_default();

    for entry in &entries {
        let Some(role) = entry["role"].as_str() else {
            continue;
        };
        let member = if let Some(email) = entry["userByEmail"].as_str() {
            if email.ends_with(".gserviceaccount.com") {
                format!("serviceAccount:{}", email)
            } else {
                format!("user:{}", email)
            }
        } else if let Some(group) = entry["groupByEmail"].as_str() {
            format!("group:{}", group)
        } else if let Some(domain) = entry["domain"].as_str() {
            format!("domain:{}", domain)
        } else if let Some(member) = entry["iamMember"].as_str() {
            member.to_string()
        } else if let Some(group @ ("allAuthenticatedUsers" | "allUsers")) =
            entry["specialGroup"].as_str()
        {
            group.to_string()
        } else {
            continue;
        };
        by_role.entry(role.to_string()).or_default().push(member);
    }

    by_role
        .into_iter()
        .map(|(role, members)| IamBinding::new(role, members))
        .collect()
}
