// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Command execution endpoints

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::api::AppState;
use crate::mikrotik::Row;

/// Raw API command: `{"path": "/ip/address/print", "params": ["?disabled=no"]}`
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub path: String,
    #[serde(default)]
    pub params: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TerminalRequest {
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct TerminalResponse {
    pub output: String,
}

/// POST /api/command
pub async fn execute_command(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<Vec<Row>>, ApiError> {
    tracing::debug!("API command {} {:?}", request.path, request.params);
    let rows = state
        .manager
        .execute_command(&request.path, &request.params)
        .await?;
    Ok(Json(rows))
}

/// POST /api/terminal
pub async fn execute_terminal(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TerminalRequest>,
) -> Result<Json<TerminalResponse>, ApiError> {
    let output = state
        .manager
        .execute_terminal_command(&request.command)
        .await?;
    Ok(Json(TerminalResponse { output }))
}
