// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Cached read endpoints

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::ApiError;
use crate::api::AppState;
use crate::mikrotik::{FirewallRule, InterfaceInfo, Route, RouterStatus};

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub identity: String,
}

pub async fn router_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RouterStatus>, ApiError> {
    Ok(Json(state.manager.get_router_status().await?))
}

pub async fn interfaces(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InterfaceInfo>>, ApiError> {
    Ok(Json(state.manager.get_interfaces().await?))
}

pub async fn identity(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let identity = state.manager.get_identity().await?;
    Ok(Json(IdentityResponse { identity }))
}

pub async fn routes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Route>>, ApiError> {
    Ok(Json(state.manager.get_routes().await?))
}

pub async fn firewall_filter(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FirewallRule>>, ApiError> {
    Ok(Json(state.manager.get_firewall_rules().await?))
}
