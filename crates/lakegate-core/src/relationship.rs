// SPDX-License-Identifier: Apache-2.0

//! Relationship graph types and the per-dataset cache entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A column as reported by the schema provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A table and its columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeOrigin {
    Inferred,
    Manual,
}

/// A link between two tables of a dataset.
///
/// Undirected for display; inferred edges point from the referencing table
/// (`table1`) to the referenced one (`table2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub table1: String,
    pub table2: String,
    pub relationship_label: String,
    pub origin: EdgeOrigin,
    /// Referencing column in `table1`, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column1: Option<String>,
    /// Referenced column in `table2`, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column2: Option<String>,
}

impl RelationshipEdge {
    pub fn inferred(
        table1: impl Into<String>,
        table2: impl Into<String>,
        label: impl Into<String>,
        column1: impl Into<String>,
        column2: impl Into<String>,
    ) -> Self {
        Self {
            table1: table1.into(),
            table2: table2.into(),
            relationship_label: label.into(),
            origin: EdgeOrigin::Inferred,
            column1: Some(column1.into()),
            column2: Some(column2.into()),
        }
    }

    pub fn manual(
        table1: impl Into<String>,
        table2: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            table1: table1.into(),
            table2: table2.into(),
            relationship_label: label.into(),
            origin: EdgeOrigin::Manual,
            column1: None,
            column2: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.table1.trim().is_empty() || self.table2.trim().is_empty() {
            return Err(CoreError::invalid_edge("both table names are required"));
        }
        if self.relationship_label.trim().is_empty() {
            return Err(CoreError::invalid_edge("relationship label is required"));
        }
        Ok(())
    }

    /// The unordered table pair, lowercase and sorted
    pub fn table_pair(&self) -> (String, String) {
        let a = self.table1.to_lowercase();
        let b = self.table2.to_lowercase();
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Same unordered pair and same label
    pub fn same_link(&self, other: &RelationshipEdge) -> bool {
        self.table_pair() == other.table_pair()
            && self
                .relationship_label
                .eq_ignore_ascii_case(&other.relationship_label)
    }
}

/// Persisted relationship graph of one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipCacheEntry {
    pub dataset_key: String,
    pub edges: Vec<RelationshipEdge>,
    /// Fingerprint of the table snapshot the inferred edges were computed from
    #[serde(default)]
    pub table_snapshot_fingerprint: String,
    /// Unset until inference has run at least once for this entry
    #[serde(default)]
    pub computed_at: Option<DateTime<Utc>>,
}

impl RelationshipCacheEntry {
    pub fn empty(dataset_key: impl Into<String>) -> Self {
        Self {
            dataset_key: dataset_key.into(),
            edges: Vec::new(),
            table_snapshot_fingerprint: String::new(),
            computed_at: None,
        }
    }

    pub fn manual_edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter().filter(|e| e.origin == EdgeOrigin::Manual)
    }

    pub fn inferred_edges(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.edges.iter().filter(|e| e.origin == EdgeOrigin::Inferred)
    }

    /// Served without recomputation: inference has run and edges exist.
    pub fn is_warm(&self) -> bool {
        self.computed_at.is_some() && !self.edges.is_empty()
    }
}
