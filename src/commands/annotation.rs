// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use lakegate_core::{AccessTier, Principal};

use crate::annotation::{AccessibleTables, Annotated};
use crate::gateway::{CatalogEntry, SearchScope};
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct AnnotatedEntriesResponse {
    pub success: bool,
    pub entries: Option<Vec<Annotated<CatalogEntry>>>,
    pub tier: Option<AccessTier>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessibleTablesResponse {
    pub success: bool,
    pub tables: Option<AccessibleTables>,
    pub error: Option<String>,
}

/// Tags already-fetched search results with `user_has_access`.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), entries = entries.len()))]
pub async fn annotate_search_results(
    state: &SharedState,
    principal: Principal,
    entries: Vec<CatalogEntry>,
) -> AnnotatedEntriesResponse {
    let annotation = state.annotator.annotate(entries, &principal).await;
    AnnotatedEntriesResponse {
        success: true,
        tier: Some(annotation.tier),
        entries: Some(annotation.items),
        error: None,
    }
}

/// Runs a catalog search over the admin project and annotates the hits.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn search_catalog(
    state: &SharedState,
    principal: Principal,
    query: String,
) -> AnnotatedEntriesResponse {
    if query.trim().is_empty() {
        return AnnotatedEntriesResponse {
            success: false,
            entries: None,
            tier: None,
            error: Some("Search query is empty".to_string()),
        };
    }
    let scope = SearchScope::project(&state.config.authority.admin_project);
    let entries = state.gateway.search_entries(&query, &scope).await;
    annotate_search_results(state, principal, entries).await
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn list_accessible_tables(
    state: &SharedState,
    principal: Principal,
    query: Option<String>,
) -> AccessibleTablesResponse {
    let tables = state
        .annotator
        .list_accessible_tables(&principal, query.as_deref())
        .await;
    AccessibleTablesResponse {
        success: true,
        tables: Some(tables),
        error: None,
    }
}
