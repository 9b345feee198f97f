// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for remote collaborators
//!
//! Transport and service-specific failures are mapped to these variants so
//! the services above the gateway can decide how to degrade.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lakegate_core::CoreError;

/// Unified error type for gateway and store operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum GatewayError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Remote service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Resource already exists: {resource}")]
    Conflict { resource: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Remote call timed out")]
    Timeout,

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl GatewayError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport { message: msg.into() }
    }

    pub fn status(status: u16, msg: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: msg.into(),
        }
    }

    pub fn conflict(resource: impl Into<String>) -> Self {
        Self::Conflict {
            resource: resource.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized { message: msg.into() }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse { message: msg.into() }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage { message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation { message: msg.into() }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<CoreError> for GatewayError {
    fn from(err: CoreError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::invalid_response(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("serialization failed: {}", err))
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
