// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS response parsing helpers

use crate::mikrotik::types::{FirewallRule, InterfaceInfo, Route, Row, SystemResource};
use crate::mikrotik::units::{parse_bytes, parse_uptime};

fn text(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

fn number<T: std::str::FromStr + Default>(row: &Row, key: &str) -> T {
    row.get(key).and_then(|v| v.parse().ok()).unwrap_or_default()
}

fn flag(row: &Row, key: &str) -> bool {
    row.get(key).is_some_and(|v| v == "true" || v == "yes")
}

pub(crate) fn parse_system(sentences: &[Row]) -> SystemResource {
    let first_opt = sentences.iter().find(|s| s.contains_key("version"));
    let empty = Row::new();
    let first = first_opt.unwrap_or(&empty);
    let uptime = first
        .get("uptime")
        .cloned()
        .unwrap_or_else(|| "0s".to_string());
    SystemResource {
        uptime_seconds: parse_uptime(&uptime),
        uptime,
        cpu_load: number(first, "cpu-load"),
        cpu_count: number(first, "cpu-count"),
        free_memory: first.get("free-memory").map_or(0, |v| parse_bytes(v)),
        total_memory: first.get("total-memory").map_or(0, |v| parse_bytes(v)),
        version: first
            .get("version")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        board_name: first
            .get("board-name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        architecture: first
            .get("architecture-name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

/// Router display name from `/system/identity/print`
pub(crate) fn parse_identity(sentences: &[Row]) -> Option<String> {
    sentences.iter().find_map(|s| text(s, "name"))
}

pub(crate) fn parse_interfaces(sentences: &[Row]) -> Vec<InterfaceInfo> {
    let mut out = Vec::new();
    for s in sentences {
        if let Some(name) = s.get("name") {
            out.push(InterfaceInfo {
                id: s.get(".id").cloned().unwrap_or_default(),
                name: name.clone(),
                kind: s
                    .get("type")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                mac_address: text(s, "mac-address"),
                mtu: s.get("mtu").and_then(|v| v.parse().ok()),
                running: flag(s, "running"),
                disabled: flag(s, "disabled"),
                rx_bytes: number(s, "rx-byte"),
                tx_bytes: number(s, "tx-byte"),
                rx_packets: number(s, "rx-packet"),
                tx_packets: number(s, "tx-packet"),
                rx_errors: number(s, "rx-error"),
                tx_errors: number(s, "tx-error"),
                comment: text(s, "comment"),
            });
        }
    }
    out
}

pub(crate) fn parse_routes(sentences: &[Row]) -> Vec<Route> {
    sentences
        .iter()
        .filter_map(|s| {
            let dst_address = s.get("dst-address")?;
            Some(Route {
                id: s.get(".id").cloned().unwrap_or_default(),
                dst_address: dst_address.clone(),
                gateway: text(s, "gateway"),
                distance: s.get("distance").and_then(|v| v.parse().ok()),
                active: flag(s, "active"),
                dynamic: flag(s, "dynamic"),
                disabled: flag(s, "disabled"),
                comment: text(s, "comment"),
            })
        })
        .collect()
}

pub(crate) fn parse_firewall_rules(sentences: &[Row]) -> Vec<FirewallRule> {
    sentences
        .iter()
        .filter_map(|s| {
            let chain = s.get("chain")?;
            Some(FirewallRule {
                id: s.get(".id").cloned().unwrap_or_default(),
                chain: chain.clone(),
                action: s
                    .get("action")
                    .cloned()
                    .unwrap_or_else(|| "accept".to_string()),
                protocol: text(s, "protocol"),
                src_address: text(s, "src-address"),
                dst_address: text(s, "dst-address"),
                dst_port: text(s, "dst-port"),
                in_interface: text(s, "in-interface"),
                disabled: flag(s, "disabled"),
                bytes: number(s, "bytes"),
                packets: number(s, "packets"),
                comment: text(s, "comment"),
            })
        })
        .collect()
}
