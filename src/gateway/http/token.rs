// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::gateway::traits::AccessTokenProvider;
use crate::observability::Sensitive;

/// Serves a fixed bearer token (from configuration or the environment)
pub struct StaticTokenProvider {
    token: Option<Sensitive<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<Sensitive<String>>) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> GatewayResult<Sensitive<String>> {
        self.token
            .clone()
            .ok_or_else(|| GatewayError::unauthorized("No access token configured"))
    }
}
