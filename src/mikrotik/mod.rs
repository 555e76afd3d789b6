//! `MikroTik` `RouterOS` API client module
//!
//! This module provides the wire protocol, login, the session seam used by
//! the connection manager, and typed parsing of the replies the dashboard reads.

mod connection;
mod session;
mod types;
mod units;

pub(crate) use connection::{
    parse_firewall_rules, parse_identity, parse_interfaces, parse_routes, parse_system,
};
pub use connection::{encode_length, encode_sentence};
pub use session::{CloseSignal, Connector, RouterSession, TcpConnector, TcpSession};
pub use types::{FirewallRule, InterfaceInfo, Route, RouterStatus, Row, SystemResource};
pub use units::{parse_bytes, parse_uptime};
