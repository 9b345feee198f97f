// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use lakegate_core::{DatasetKey, RelationshipEdge};

use crate::relations::RelationshipSource;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct RelationshipsResponse {
    pub success: bool,
    pub edges: Option<Vec<RelationshipEdge>>,
    pub source: Option<RelationshipSource>,
    pub error: Option<String>,
}

impl RelationshipsResponse {
    fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            edges: None,
            source: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RelationshipMutationResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), project = %project_id, dataset = %dataset_id))]
pub async fn get_dataset_relationships(
    state: &SharedState,
    project_id: String,
    dataset_id: String,
    force_refresh: bool,
) -> RelationshipsResponse {
    let key = match DatasetKey::try_new(&project_id, &dataset_id) {
        Ok(key) => key,
        Err(e) => return RelationshipsResponse::failed(e),
    };
    let result = state
        .relationships
        .get_relationships(&key, force_refresh)
        .await;
    RelationshipsResponse {
        success: true,
        edges: Some(result.edges),
        source: Some(result.source),
        error: None,
    }
}

/// Returns every stored edge of the dataset after the addition.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), project = %project_id, dataset = %dataset_id))]
pub async fn add_manual_relationship(
    state: &SharedState,
    project_id: String,
    dataset_id: String,
    edge: RelationshipEdge,
) -> RelationshipsResponse {
    let key = match DatasetKey::try_new(&project_id, &dataset_id) {
        Ok(key) => key,
        Err(e) => return RelationshipsResponse::failed(e),
    };
    match state.relationships.add_manual_relationship(&key, edge) {
        Ok(edges) => RelationshipsResponse {
            success: true,
            edges: Some(edges),
            source: None,
            error: None,
        },
        Err(e) => RelationshipsResponse::failed(e),
    }
}

#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), project = %project_id, dataset = %dataset_id))]
pub async fn invalidate_relationship_cache(
    state: &SharedState,
    project_id: String,
    dataset_id: String,
) -> RelationshipMutationResponse {
    let result = DatasetKey::try_new(&project_id, &dataset_id)
        .map_err(|e| e.to_string())
        .and_then(|key| {
            state
                .relationships
                .invalidate(&key)
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => RelationshipMutationResponse {
            success: true,
            error: None,
        },
        Err(e) => RelationshipMutationResponse {
            success: false,
            error: Some(e),
        },
    }
}
