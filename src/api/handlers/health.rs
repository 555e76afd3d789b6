use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::api::AppState;
use crate::manager::HealthSnapshot;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check endpoint response structure
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Address the HTTP server is bound to
    pub listen_addr: String,
    #[serde(flatten)]
    pub router: HealthSnapshot,
}

/// GET /health
///
/// Always answers 200; `status` is "ok" only while the router session is up.
/// The identity refresh is raced against a 2s timeout, after which the
/// cached snapshot is served.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let router = match tokio::time::timeout(HEALTH_TIMEOUT, state.manager.health_check()).await {
        Ok(snapshot) => snapshot,
        Err(_) => {
            tracing::debug!("Health check timed out, serving last known state");
            state.manager.snapshot()
        }
    };

    let response = HealthResponse {
        status: if router.connected { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        listen_addr: state.config.server_addr.clone(),
        router,
    };

    (StatusCode::OK, Json(response))
}
