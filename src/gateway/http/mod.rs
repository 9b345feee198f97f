// SPDX-License-Identifier: Apache-2.0

//! HTTP implementations of the remote collaborator traits.

pub mod agent;
pub mod authority;
pub mod catalog;
pub mod token;

pub use agent::HttpAgentClient;
pub use authority::HttpAuthorityClient;
pub use catalog::HttpCatalogClient;
pub use token::StaticTokenProvider;

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::gateway::error::{GatewayError, GatewayResult};

/// Characters escaped inside a single URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

pub(crate) fn build_client(timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::config(format!("Failed to build HTTP client: {}", e)))
}

/// Maps non-success statuses onto gateway errors and decodes the JSON body.
pub(crate) async fn json_body(response: Response, resource: &str) -> GatewayResult<Value> {
    let status = response.status();
    if status.is_success() {
        return response.json::<Value>().await.map_err(GatewayError::from);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_api_error(&body).unwrap_or_else(|| format!("HTTP {}: {}", status, body));
    Err(match status {
        StatusCode::CONFLICT => GatewayError::conflict(resource),
        StatusCode::NOT_FOUND => GatewayError::not_found(resource),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::unauthorized(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::status(status.as_u16(), message),
    })
}

/// Pulls `error.message` out of a Google-style error payload
fn extract_api_error(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed["error"]["message"].as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_keep_project_punctuation() {
        assert_eq!(encode_segment("example.com:proj"), "example.com:proj");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error":{"code":403,"message":"Permission denied","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(extract_api_error(body).as_deref(), Some("Permission denied"));
        assert_eq!(extract_api_error("not json"), None);
    }
}
