// SPDX-License-Identifier: Apache-2.0

//! Error types for the core data model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CoreError {
    #[error("Invalid table reference: {reference}")]
    InvalidTableReference { reference: String },

    #[error("Invalid dataset key: {key}")]
    InvalidDatasetKey { key: String },

    #[error("Invalid relationship edge: {message}")]
    InvalidEdge { message: String },
}

impl CoreError {
    pub fn invalid_reference(reference: impl Into<String>) -> Self {
        Self::InvalidTableReference {
            reference: reference.into(),
        }
    }

    pub fn invalid_dataset(key: impl Into<String>) -> Self {
        Self::InvalidDatasetKey { key: key.into() }
    }

    pub fn invalid_edge(msg: impl Into<String>) -> Self {
        Self::InvalidEdge {
            message: msg.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
