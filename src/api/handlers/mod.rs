// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod command;
mod error;
mod health;
mod metrics;
mod router;

pub use command::{
    CommandRequest, TerminalRequest, TerminalResponse, execute_command, execute_terminal,
};
pub use error::{ApiError, ErrorResponse};
pub use health::{HealthResponse, health_check};
pub use metrics::metrics_handler;
pub use router::{IdentityResponse, firewall_filter, identity, interfaces, router_status, routes};
