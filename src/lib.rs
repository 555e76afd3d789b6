// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # MikroTik Dashboard
//!
//! Backend core for a MikroTik router dashboard.
//!
//! The heart of the crate is the [`ConnectionManager`]: it owns one
//! RouterOS API session, runs every command through a FIFO queue,
//! reconnects with bounded exponential backoff and caches hot reads for a
//! few seconds. A thin axum API exposes it over HTTP.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `config`: configuration management
//! - `error`: error types
//! - `manager`: connection manager, command queue, cache and terminal syntax
//! - `metrics`: operational Prometheus metrics
//! - `mikrotik`: RouterOS wire protocol, login and reply parsing
//! - `prelude`: commonly used types and traits

mod api;
mod config;
mod error;
mod manager;
mod metrics;
mod mikrotik;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::{Config, RouterSettings};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Connection manager and its public vocabulary
pub use manager::{
    BACKOFF, ConnectionManager, ConnectionState, EMPTY_OUTPUT, HealthSnapshot, TerminalCommand,
    backoff_delay, cache_keys, format_rows,
};

/// Operational metrics registry
pub use metrics::MetricsRegistry;

/// RouterOS session seam and reply types
pub use mikrotik::{
    CloseSignal, Connector, FirewallRule, InterfaceInfo, Route, RouterSession, RouterStatus, Row,
    SystemResource, TcpConnector, TcpSession,
};

/// RouterOS wire protocol encoding and unit parsing (public for tests)
pub use mikrotik::{encode_length, encode_sentence, parse_bytes, parse_uptime};
