//! HTTP API module for the MikroTik dashboard backend
//!
//! Thin JSON surface over the connection manager.
//!
//! # Endpoints
//! - `GET /health` - connection health snapshot
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/router/status` - identity and system resources
//! - `GET /api/interfaces` - interface list
//! - `GET /api/identity` - router identity
//! - `GET /api/routes` - IP routes
//! - `GET /api/firewall/filter` - firewall filter rules
//! - `POST /api/command` - raw API command
//! - `POST /api/terminal` - CLI-style command with text output

pub mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/router/status", get(handlers::router_status))
        .route("/api/interfaces", get(handlers::interfaces))
        .route("/api/identity", get(handlers::identity))
        .route("/api/routes", get(handlers::routes))
        .route("/api/firewall/filter", get(handlers::firewall_filter))
        .route("/api/command", post(handlers::execute_command))
        .route("/api/terminal", post(handlers::execute_terminal))
        .with_state(state)
}
