// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use lakegate_core::{DatasetKey, RelationshipEdge, Table, TableReference};

use crate::agents::{build_system_instruction, describe_tables, ConversationContext};
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub context: Option<ConversationContext>,
    pub error: Option<String>,
}

/// Resolves the conversation context for a table set.
///
/// Unparseable references are dropped; the request fails only when none
/// remain. Reuses or provisions the persistent agent; when that fails the response
/// still succeeds with an inline context for this request only. With
/// `include_schema` the instruction is extended with the tables' columns and
/// relationships.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4(), tables = table_references.len()))]
pub async fn get_or_create_conversation_agent(
    state: &SharedState,
    table_references: Vec<String>,
    system_instruction: String,
    include_schema: bool,
) -> ConversationResponse {
    let refs: Vec<TableReference> = table_references
        .iter()
        .filter_map(|raw| match TableReference::parse(raw) {
            Ok(reference) => Some(reference),
            Err(e) => {
                debug!("Dropping table reference {:?}: {}", raw, e);
                None
            }
        })
        .collect();
    if refs.is_empty() {
        return failed("At least one valid table reference is required");
    }

    let instruction = if include_schema {
        let description = schema_description(state, &refs).await;
        build_system_instruction(&system_instruction, &description)
    } else {
        system_instruction
    };

    let agent = state.agents.get_or_create(&refs, &instruction).await;
    ConversationResponse {
        success: true,
        context: Some(ConversationContext::resolve(agent, &refs, &instruction)),
        error: None,
    }
}

fn failed(error: impl ToString) -> ConversationResponse {
    ConversationResponse {
        success: false,
        context: None,
        error: Some(error.to_string()),
    }
}

/// Columns and relationships of the referenced tables, across their datasets.
async fn schema_description(state: &SharedState, refs: &[TableReference]) -> String {
    let datasets: BTreeSet<DatasetKey> = refs.iter().map(|r| r.dataset_key()).collect();

    let per_dataset = datasets.iter().map(|dataset| async move {
        let wanted: BTreeSet<String> = refs
            .iter()
            .filter(|r| r.dataset_key() == *dataset)
            .map(|r| r.table_id.to_lowercase())
            .collect();
        let is_wanted = |name: &str| wanted.contains(&name.to_lowercase());

        let tables: Vec<Table> = state
            .gateway
            .fetch_schema(dataset)
            .await
            .into_iter()
            .filter(|t| is_wanted(&t.name))
            .collect();
        let edges: Vec<RelationshipEdge> = state
            .relationships
            .get_relationships(dataset, false)
            .await
            .edges
            .into_iter()
            .filter(|e| is_wanted(&e.table1) && is_wanted(&e.table2))
            .collect();
        (tables, edges)
    });

    let mut tables = Vec::new();
    let mut edges = Vec::new();
    for (t, e) in join_all(per_dataset).await {
        tables.extend(t);
        edges.extend(e);
    }
    debug!("Schema summary covers {} tables", tables.len());
    describe_tables(&tables, &edges)
}
