// SPDX-License-Identifier: Apache-2.0

//! Log export for support.

use serde::Serialize;

use crate::observability;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct LogsExportResponse {
    pub success: bool,
    pub filename: Option<String>,
    pub content: Option<String>,
    pub error: Option<String>,
}

pub async fn export_logs(state: &SharedState) -> LogsExportResponse {
    match observability::collect_logs(&state.config.log_dir()) {
        Ok(export) => LogsExportResponse {
            success: true,
            filename: Some(export.filename),
            content: Some(export.content),
            error: None,
        },
        Err(err) => LogsExportResponse {
            success: false,
            filename: None,
            content: None,
            error: Some(err),
        },
    }
}
