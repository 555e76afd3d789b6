// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Operational metrics for the RouterOS connection manager

mod labels;
mod registry;

/// Labels for command and cache metrics
pub use labels::{CacheLabels, CommandLabels};

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
