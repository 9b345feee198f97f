// SPDX-License-Identifier: Apache-2.0

//! Table and dataset references
//!
//! The catalog hands out fully-qualified names in several shapes. Everything
//! downstream works on the normalized `project.dataset.table` form.
//!
//! Accepted table forms:
//! - `project.dataset.table`
//! - `project:dataset.table` (legacy SQL)
//! - `bigquery:project.dataset.table` (catalog linked name)
//! - `` `project.dataset.table` `` (quoted)
//! - `projects/p/datasets/d/tables/t`, optionally prefixed by
//!   `//bigquery.googleapis.com/`

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const LINKED_PREFIX: &str = "bigquery:";

fn table_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?://bigquery\.googleapis\.com/)?projects/([^/]+)/datasets/([^/]+)/tables/([^/]+)$",
        )
        .expect("table path pattern is valid")
    })
}

fn dataset_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?://bigquery\.googleapis\.com/)?projects/([^/]+)/datasets/([^/]+)$")
            .expect("dataset path pattern is valid")
    })
}

/// A fully resolved table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableReference {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Parses any of the supported fully-qualified name forms.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim().trim_matches('`');
        if trimmed.is_empty() {
            return Err(CoreError::invalid_reference(raw));
        }

        if let Some(caps) = table_path_regex().captures(trimmed) {
            return Self::checked(raw, &caps[1], &caps[2], &caps[3]);
        }

        let body = trimmed.strip_prefix(LINKED_PREFIX).unwrap_or(trimmed);
        let parts: Vec<&str> = body.rsplitn(3, '.').collect();
        match parts.as_slice() {
            // project:dataset.table
            [table, project_and_dataset] => {
                let (project, dataset) = project_and_dataset
                    .rsplit_once(':')
                    .ok_or_else(|| CoreError::invalid_reference(raw))?;
                Self::checked(raw, project, dataset, table)
            }
            // example.com:project:dataset.table
            [table, dataset, project] if dataset.contains(':') => {
                let (project_tail, dataset) = dataset
                    .rsplit_once(':')
                    .ok_or_else(|| CoreError::invalid_reference(raw))?;
                let project = format!("{}.{}", project, project_tail);
                Self::checked(raw, &project, dataset, table)
            }
            [table, dataset, project] => Self::checked(raw, project, dataset, table),
            _ => Err(CoreError::invalid_reference(raw)),
        }
    }

    fn checked(raw: &str, project: &str, dataset: &str, table: &str) -> CoreResult<Self> {
        if !valid_segment(project) || !valid_segment(dataset) || !valid_segment(table) {
            return Err(CoreError::invalid_reference(raw));
        }
        Ok(Self::new(project, dataset, table))
    }

    /// `project.dataset.table`
    pub fn canonical(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }

    pub fn dataset_key(&self) -> DatasetKey {
        DatasetKey::new(&self.project_id, &self.dataset_id)
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// Identifies a dataset within a project (`project.dataset`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetKey {
    pub project_id: String,
    pub dataset_id: String,
}

impl DatasetKey {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }

    /// Parses `project.dataset`, `project:dataset` or `projects/p/datasets/d`.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim().trim_matches('`');
        if let Some(caps) = dataset_path_regex().captures(trimmed) {
            return Self::checked(raw, &caps[1], &caps[2]);
        }

        let body = trimmed.strip_prefix(LINKED_PREFIX).unwrap_or(trimmed);
        let (project, dataset) = body
            .rsplit_once(':')
            .filter(|(_, dataset)| !dataset.contains('.'))
            .or_else(|| body.rsplit_once('.'))
            .ok_or_else(|| CoreError::invalid_dataset(raw))?;
        Self::checked(raw, project, dataset)
    }

    /// Builds a key from already separated ids, validating both.
    pub fn try_new(project_id: &str, dataset_id: &str) -> CoreResult<Self> {
        Self::checked(&format!("{}.{}", project_id, dataset_id), project_id, dataset_id)
    }

    fn checked(raw: &str, project: &str, dataset: &str) -> CoreResult<Self> {
        if !valid_segment(project) || !valid_segment(dataset) {
            return Err(CoreError::invalid_dataset(raw));
        }
        Ok(Self::new(project, dataset))
    }

    pub fn table(&self, table_id: impl Into<String>) -> TableReference {
        TableReference::new(&self.project_id, &self.dataset_id, table_id)
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_id)
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '`' | '|'))
}
