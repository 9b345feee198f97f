// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lakegate_core::{AccessTier, PermissionDecision, TableReference};

use crate::gateway::CatalogEntry;

/// Anything in a result set that names a resource
pub trait ResourceItem {
    /// Fully-qualified name of the underlying table, in any catalog form
    fn resource_name(&self) -> &str;
}

impl ResourceItem for CatalogEntry {
    fn resource_name(&self) -> &str {
        &self.linked_resource
    }
}

/// A result item tagged with the access verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotated<T> {
    #[serde(flatten)]
    pub item: T,
    pub user_has_access: bool,
}

/// Output of one annotation call
#[derive(Debug, Clone)]
pub struct Annotation<T> {
    pub items: Vec<Annotated<T>>,
    /// Tier that resolved the request; `Dataset` when the cascade reached the last stage
    pub tier: AccessTier,
    /// Request-scoped verdicts, one per resolved resource
    pub decisions: Vec<PermissionDecision>,
}

impl<T> Annotation<T> {
    pub fn granted_count(&self) -> usize {
        self.items.iter().filter(|i| i.user_has_access).count()
    }
}

/// Tables the principal may use, with a per-dataset grouping for display
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibleTables {
    pub tables: Vec<TableReference>,
    /// `project.dataset` → table ids
    pub grouped_by_dataset: BTreeMap<String, Vec<String>>,
}

impl AccessibleTables {
    pub fn from_tables(mut tables: Vec<TableReference>) -> Self {
        tables.sort();
        tables.dedup();
        let mut grouped_by_dataset: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for table in &tables {
            grouped_by_dataset
                .entry(table.dataset_key().to_string())
                .or_default()
                .push(table.table_id.clone());
        }
        Self {
            tables,
            grouped_by_dataset,
        }
    }
}
