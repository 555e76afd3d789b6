// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the MikroTik dashboard backend

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error (fatal, never retried)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection to the router failed or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single command was rejected by the router
    #[error("Command error: {0}")]
    Command(String),

    /// Malformed terminal command
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl AppError {
    /// Whether this error means the session itself is unusable
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Io(_))
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
