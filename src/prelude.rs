// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! ```rust
//! use mikrotik_dashboard::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, RouterSettings};
pub use crate::error::{AppError, Result};

// Connection manager
pub use crate::manager::{ConnectionManager, ConnectionState, HealthSnapshot, TerminalCommand};
pub use crate::metrics::MetricsRegistry;

// RouterOS session and replies
pub use crate::mikrotik::{
    Connector, FirewallRule, InterfaceInfo, Route, RouterSession, RouterStatus, Row,
    SystemResource, TcpConnector,
};
