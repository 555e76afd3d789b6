// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router session seam
//!
//! The connection manager only ever sees these two traits: a [`Connector`]
//! that performs the TCP + login handshake, and the [`RouterSession`] it
//! yields. A session reports its own death through [`RouterSession::closed`];
//! an intentional [`RouterSession::close`] does not fire that signal.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

use super::connection::RouterOsConnection;
use super::types::Row;
use crate::config::RouterSettings;
use crate::error::{AppError, Result};

/// Receives `Some(reason)` once the session has died
pub type CloseSignal = watch::Receiver<Option<String>>;

/// An established, logged-in RouterOS API session
#[async_trait]
pub trait RouterSession: Send + Sync {
    /// Sends one command sentence and collects its reply rows
    async fn write(&self, path: &str, params: &[String]) -> Result<Vec<Row>>;

    /// Closes the session on purpose
    async fn close(&self) -> Result<()>;

    /// Subscribes to the unexpected-close notification
    fn closed(&self) -> CloseSignal;
}

/// Opens new sessions
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, settings: &RouterSettings) -> Result<Arc<dyn RouterSession>>;
}

/// Connects over plain TCP to the RouterOS API port
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, settings: &RouterSettings) -> Result<Arc<dyn RouterSession>> {
        let addr = settings.address();
        let mut conn = RouterOsConnection::connect(&addr, settings.timeout).await?;
        tracing::trace!("Connection established, attempting login");
        conn.login(&settings.username, &settings.password).await?;
        Ok(Arc::new(TcpSession::new(conn)))
    }
}

/// A session over one TCP connection
///
/// Any transport failure (I/O error, read timeout, `!fatal`) drops the
/// connection and fires the close signal; `!trap` replies do not.
pub struct TcpSession {
    conn: Mutex<Option<RouterOsConnection>>,
    closed_tx: watch::Sender<Option<String>>,
}

impl TcpSession {
    fn new(conn: RouterOsConnection) -> Self {
        let (closed_tx, _) = watch::channel(None);
        Self {
            conn: Mutex::new(Some(conn)),
            closed_tx,
        }
    }
}

#[async_trait]
impl RouterSession for TcpSession {
    async fn write(&self, path: &str, params: &[String]) -> Result<Vec<Row>> {
        let mut guard = self.conn.lock().await;
        let Some(conn) = guard.as_mut() else {
            return Err(AppError::Connection("Session is closed".to_string()));
        };
        match conn.command(path, params).await {
            Err(e) if e.is_connection() => {
                tracing::debug!("Transport failure on {}: {}", path, e);
                guard.take();
                self.closed_tx.send_replace(Some(e.to_string()));
                Err(e)
            }
            other => other,
        }
    }

    async fn close(&self) -> Result<()> {
        let conn = self.conn.lock().await.take();
        if let Some(mut conn) = conn {
            conn.shutdown().await?;
        }
        Ok(())
    }

    fn closed(&self) -> CloseSignal {
        self.closed_tx.subscribe()
    }
}
