// SPDX-License-Identifier: Apache-2.0

//! Shapes exchanged with the authority and the catalog.

use serde::{Deserialize, Serialize};

use lakegate_core::{Principal, TableReference};

/// One role binding of an IAM policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamBinding {
    pub role: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl IamBinding {
    pub fn new(role: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            role: role.into(),
            members,
        }
    }

    pub fn includes(&self, principal: &Principal) -> bool {
        self.members.iter().any(|m| principal.matches_member(m))
    }
}

/// Restricts a catalog search to a set of projects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchScope {
    pub include_project_ids: Vec<String>,
}

impl SearchScope {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            include_project_ids: vec![project_id.into()],
        }
    }
}

/// A catalog search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Fully-qualified name of the underlying resource, in any catalog form
    pub linked_resource: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogEntry {
    pub fn table(linked_resource: impl Into<String>) -> Self {
        Self {
            linked_resource: linked_resource.into(),
            display_name: None,
            entry_type: Some("TABLE".to_string()),
            description: None,
        }
    }

    pub fn table_reference(&self) -> Option<TableReference> {
        TableReference::parse(&self.linked_resource).ok()
    }
}
