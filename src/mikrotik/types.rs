// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Type definitions for RouterOS replies

use serde::Serialize;
use std::collections::BTreeMap;

/// One reply sentence (`!re`) as attribute -> value, including `.id`-style internals
pub type Row = BTreeMap<String, String>;

/// System resource information (`/system/resource/print`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemResource {
    pub uptime: String,
    pub uptime_seconds: u64,
    pub cpu_load: u64,
    pub cpu_count: u64,
    pub free_memory: u64,
    pub total_memory: u64,
    pub version: String,
    pub board_name: String,
    pub architecture: String,
}

impl SystemResource {
    /// Used memory as a percentage of total, 0 when total is unknown
    #[must_use]
    pub fn memory_used_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        let used = self.total_memory.saturating_sub(self.free_memory);
        #[allow(clippy::cast_precision_loss)]
        let pct = used as f64 * 100.0 / self.total_memory as f64;
        (pct * 10.0).round() / 10.0
    }
}

/// Aggregate dashboard status: identity plus resources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouterStatus {
    pub identity: String,
    pub resource: SystemResource,
    pub memory_used_percent: f64,
}

/// A network interface (`/interface/print`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceInfo {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub mac_address: Option<String>,
    pub mtu: Option<u32>,
    pub running: bool,
    pub disabled: bool,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub comment: Option<String>,
}

/// An IP route (`/ip/route/print`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub dst_address: String,
    pub gateway: Option<String>,
    pub distance: Option<u32>,
    pub active: bool,
    pub dynamic: bool,
    pub disabled: bool,
    pub comment: Option<String>,
}

/// A firewall filter rule (`/ip/firewall/filter/print`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirewallRule {
    pub id: String,
    pub chain: String,
    pub action: String,
    pub protocol: Option<String>,
    pub src_address: Option<String>,
    pub dst_address: Option<String>,
    pub dst_port: Option<String>,
    pub in_interface: Option<String>,
    pub disabled: bool,
    pub bytes: u64,
    pub packets: u64,
    pub comment: Option<String>,
}
