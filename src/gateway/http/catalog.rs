// SPDX-License-Identifier: Apache-2.0

//! Catalog search and table schema lookups over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use lakegate_core::{Column, DatasetKey, TableReference};

use super::{encode_segment, json_body};
use crate::gateway::error::GatewayResult;
use crate::gateway::traits::{AccessTokenProvider, CatalogClient};
use crate::gateway::types::{CatalogEntry, SearchScope};

const SEARCH_PAGE_SIZE: u32 = 500;
const MAX_PAGES: usize = 20;

pub struct HttpCatalogClient {
    client: Client,
    tokens: Arc<dyn AccessTokenProvider>,
    catalog_url: String,
    bigquery_url: String,
}

impl HttpCatalogClient {
    pub fn new(
        client: Client,
        tokens: Arc<dyn AccessTokenProvider>,
        catalog_url: impl Into<String>,
        bigquery_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tokens,
            catalog_url: catalog_url.into(),
            bigquery_url: bigquery_url.into(),
        }
    }

    fn dataset_url(&self, dataset: &DatasetKey) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/datasets/{}",
            self.bigquery_url.trim_end_matches('/'),
            encode_segment(&dataset.project_id),
            encode_segment(&dataset.dataset_id)
        )
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search_entries(
        &self,
        query: &str,
        scope: &SearchScope,
    ) -> GatewayResult<Vec<CatalogEntry>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/v1/catalog:search", self.catalog_url.trim_end_matches('/'));

        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut body = json!({
                "query": query,
                "scope": { "includeProjectIds": scope.include_project_ids },
                "pageSize": SEARCH_PAGE_SIZE,
            });
            if let Some(ref t) = page_token {
                body["pageToken"] = json!(t);
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(token.expose())
                .json(&body)
                .send()
                .await?;
            let page = json_body(response, "catalog:search").await?;
            entries.extend(entries_from_search(&page));

            page_token = next_page_token(&page);
            if page_token.is_none() {
                break;
            }
        }

        debug!("Catalog search returned {} entries", entries.len());
        Ok(entries)
    }

    async fn list_tables(&self, dataset: &DatasetKey) -> GatewayResult<Vec<String>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/tables", self.dataset_url(dataset));

        let mut tables = Vec::new();
        let mut page_token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut request = self.client.get(&url).bearer_auth(token.expose());
            if let Some(ref t) = page_token {
                request = request.query(&[("pageToken", t.as_str())]);
            }
            let page = json_body(request.send().await?, &dataset.to_string()).await?;
            tables.extend(table_ids_from_list(&page));

            page_token = next_page_token(&page);
            if page_token.is_none() {
                break;
            }
        }
        Ok(tables)
    }

    async fn get_table_schema(&self, table: &TableReference) -> GatewayResult<Vec<Column>> {
        let token = self.tokens.access_token().await?;
        let url = format!(
            "{}/tables/{}",
            self.dataset_url(&table.dataset_key()),
            encode_segment(&table.table_id)
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await?;
        let body = json_body(response, &table.canonical()).await?;
        Ok(columns_from_table(&body))
    }
}

fn next_page_token(page: &Value) -> Option<String> {
    page["nextPageToken"]
        .as_str()
        .filter(|t| !t.is_empty())
        .map(String::from)
}

pub(crate) fn entries_from_search(page: &Value) -> Vec<CatalogEntry> {
    page["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    let linked = r["linkedResource"].as_str()?;
                    Some(CatalogEntry {
                        linked_resource: linked.to_string(),
                        display_name: r["displayName"].as_str().map(String::from),
                        entry_type: r["searchResultSubtype"].as_str().map(String::from),
                        description: r["description"].as_str().map(String::from),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn table_ids_from_list(page: &Value) -> Vec<String> {
    page["tables"]
        .as_array()
        .map(|tables| {
            tables
                .iter()
                .filter_map(|t| t["tableReference"]["tableId"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Top-level schema fields. Nested RECORD fields are reported as a single column.
pub(crate) fn columns_from_table(body: &Value) -> Vec<Column> {
    body["schema"]["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| {
                    let name = f["name"].as_str()?;
                    let data_type = f["type"].as_str().unwrap_or("STRING");
                    Some(Column::new(name, data_type))
                })
                .collect()
        })
        .unwrap_or_default()
}
