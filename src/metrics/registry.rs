// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry for the connection manager

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::metrics::{CacheLabels, CommandLabels};

#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    commands: Family<CommandLabels, Counter>,
    command_duration_seconds: Histogram,
    queue_depth: Gauge,
    connect_attempts: Counter,
    connect_failures: Counter,
    reconnect_attempts: Counter,
    unexpected_disconnects: Counter,
    connected: Gauge,
    cache_requests: Family<CacheLabels, Counter>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let commands = Family::<CommandLabels, Counter>::default();
        registry.register(
            "routeros_commands",
            "RouterOS commands executed through the queue, by outcome",
            commands.clone(),
        );
        let command_duration_seconds = Histogram::new(exponential_buckets(0.005, 2.0, 12));
        registry.register(
            "routeros_command_duration_seconds",
            "Wire time of a single RouterOS command",
            command_duration_seconds.clone(),
        );
        let queue_depth = Gauge::default();
        registry.register(
            "routeros_command_queue_depth",
            "Commands waiting for the session",
            queue_depth.clone(),
        );
        let connect_attempts = Counter::default();
        registry.register(
            "routeros_connect_attempts",
            "Connection handshakes started",
            connect_attempts.clone(),
        );
        let connect_failures = Counter::default();
        registry.register(
            "routeros_connect_failures",
            "Connection handshakes that failed",
            connect_failures.clone(),
        );
        let reconnect_attempts = Counter::default();
        registry.register(
            "routeros_reconnect_attempts",
            "Automatic reconnect attempts after an unexpected close",
            reconnect_attempts.clone(),
        );
        let unexpected_disconnects = Counter::default();
        registry.register(
            "routeros_unexpected_disconnects",
            "Sessions that closed without disconnect() being called",
            unexpected_disconnects.clone(),
        );
        let connected = Gauge::default();
        registry.register(
            "routeros_connected",
            "Session status (1=connected,0=not connected)",
            connected.clone(),
        );
        let cache_requests = Family::<CacheLabels, Counter>::default();
        registry.register(
            "routeros_cache_requests",
            "Cached getter lookups by key and hit/miss",
            cache_requests.clone(),
        );

        Self {
            registry: Arc::new(registry),
            commands,
            command_duration_seconds,
            queue_depth,
            connect_attempts,
            connect_failures,
            reconnect_attempts,
            unexpected_disconnects,
            connected,
            cache_requests,
        }
    }

    pub fn encode_metrics(&self) -> Result<String> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry).map_err(|e| AppError::Metrics(e.to_string()))?;
        Ok(buffer)
    }

    pub fn record_command(&self, outcome: &str, duration: Duration) {
        self.commands
            .get_or_create(&CommandLabels {
                outcome: outcome.to_string(),
            })
            .inc();
        self.command_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn command_enqueued(&self) {
        self.queue_depth.inc();
    }

    pub fn command_dequeued(&self) {
        self.queue_depth.dec();
    }

    pub fn record_connect_attempt(&self, success: bool) {
        self.connect_attempts.inc();
        if !success {
            self.connect_failures.inc();
        }
    }

    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.inc();
    }

    pub fn record_unexpected_disconnect(&self) {
        self.unexpected_disconnects.inc();
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.set(i64::from(connected));
    }

    pub fn record_cache_lookup(&self, key: &str, hit: bool) {
        self.cache_requests
            .get_or_create(&CacheLabels {
                key: key.to_string(),
                result: if hit { "hit" } else { "miss" }.to_string(),
            })
            .inc();
    }
}
