// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the MikroTik dashboard backend
//!
//! Loads configuration from environment variables (and an optional `.env` file).

use std::time::Duration;

use crate::error::{AppError, Result};

#[cfg(test)]
mod tests;

/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:3000";
    pub const ROUTEROS_PORT: u16 = 8728;
    pub const ROUTEROS_USERNAME: &str = "admin";
    pub const ROUTEROS_PASSWORD: &str = "";
    pub const ROUTEROS_TIMEOUT_MS: u64 = 10_000;
    pub const ROUTEROS_KEEPALIVE_SEC: u64 = 30;
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const ROUTEROS_HOST: &str = "ROUTEROS_HOST";
    pub const ROUTEROS_PORT: &str = "ROUTEROS_PORT";
    pub const ROUTEROS_USERNAME: &str = "ROUTEROS_USERNAME";
    pub const ROUTEROS_PASSWORD: &str = "ROUTEROS_PASSWORD";
    pub const ROUTEROS_TIMEOUT_MS: &str = "ROUTEROS_TIMEOUT_MS";
    pub const ROUTEROS_KEEPALIVE_SEC: &str = "ROUTEROS_KEEPALIVE_SEC";
    pub const MAX_RECONNECT_ATTEMPTS: &str = "ROUTEROS_MAX_RECONNECT_ATTEMPTS";
}

/// Connection settings for the managed router
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Connect timeout and per-command read timeout
    pub timeout: Duration,
    pub keepalive_interval: Duration,
    pub max_reconnect_attempts: u32,
}

impl RouterSettings {
    /// Settings for `host` with every other field at its default
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: defaults::ROUTEROS_PORT,
            username: defaults::ROUTEROS_USERNAME.to_string(),
            password: defaults::ROUTEROS_PASSWORD.to_string(),
            timeout: Duration::from_millis(defaults::ROUTEROS_TIMEOUT_MS),
            keepalive_interval: Duration::from_secs(defaults::ROUTEROS_KEEPALIVE_SEC),
            max_reconnect_attempts: defaults::MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// `host:port` socket address string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates router settings
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.host.trim().is_empty() {
            return Err(format!("{} cannot be empty", env_vars::ROUTEROS_HOST));
        }

        if self.port == 0 {
            return Err(format!("{} must be non-zero", env_vars::ROUTEROS_PORT));
        }

        if self.username.trim().is_empty() {
            return Err(format!("{} cannot be empty", env_vars::ROUTEROS_USERNAME));
        }

        if self.timeout.is_zero() {
            return Err(format!("{} must be non-zero", env_vars::ROUTEROS_TIMEOUT_MS));
        }

        if self.keepalive_interval.is_zero() {
            return Err(format!(
                "{} must be non-zero",
                env_vars::ROUTEROS_KEEPALIVE_SEC
            ));
        }

        Ok(())
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub router: RouterSettings,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when `ROUTEROS_HOST` is missing or any
    /// numeric setting cannot be parsed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr =
            lookup(env_vars::SERVER_ADDR).unwrap_or_else(|| defaults::SERVER_ADDR.to_string());

        let host = lookup(env_vars::ROUTEROS_HOST)
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!("{} is not set", env_vars::ROUTEROS_HOST))
            })?;

        let mut router = RouterSettings::new(host);
        if let Some(port) = parse_var::<u16>(&lookup, env_vars::ROUTEROS_PORT)? {
            router.port = port;
        }
        if let Some(username) = lookup(env_vars::ROUTEROS_USERNAME) {
            router.username = username;
        }
        if let Some(password) = lookup(env_vars::ROUTEROS_PASSWORD) {
            router.password = password;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, env_vars::ROUTEROS_TIMEOUT_MS)? {
            router.timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, env_vars::ROUTEROS_KEEPALIVE_SEC)? {
            router.keepalive_interval = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<u32>(&lookup, env_vars::MAX_RECONNECT_ATTEMPTS)? {
            router.max_reconnect_attempts = n;
        }

        router.validate().map_err(AppError::Config)?;

        Ok(Config {
            server_addr,
            router,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("Invalid value for {name}: '{raw}'"))),
        None => Ok(None),
    }
}
