// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! FIFO command queue drained by a single consumer task

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use super::SessionSlot;
use crate::error::{AppError, Result};
use crate::metrics::MetricsRegistry;
use crate::mikrotik::{RouterSession, Row};

/// One pending command and the caller waiting for it
pub(super) struct QueuedCommand {
    pub(super) path: String,
    pub(super) params: Vec<String>,
    pub(super) responder: oneshot::Sender<Result<Vec<Row>>>,
}

/// Executes queued commands one at a time, in arrival order
///
/// Runs until every sender is gone. A panic inside a session write is turned
/// into a rejected command and the loop moves on to the next one.
pub(super) async fn drain(
    mut rx: mpsc::UnboundedReceiver<QueuedCommand>,
    session: SessionSlot,
    metrics: MetricsRegistry,
) {
    tracing::debug!("Command queue started");

    while let Some(command) = rx.recv().await {
        metrics.command_dequeued();
        let QueuedCommand {
            path,
            params,
            responder,
        } = command;

        let current = session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let started = Instant::now();

        let result = match current {
            Some(session) => execute(&session, &path, &params).await,
            None => Err(AppError::Connection("Not connected to router".to_string())),
        };

        let elapsed = started.elapsed();
        metrics.record_command(outcome(&result), elapsed);
        match &result {
            Ok(rows) => tracing::debug!("{} -> {} rows in {:?}", path, rows.len(), elapsed),
            Err(e) => tracing::debug!("{} failed after {:?}: {}", path, elapsed, e),
        }

        if responder.send(result).is_err() {
            tracing::debug!("Caller of {} went away before the reply", path);
        }
    }

    tracing::debug!("Command queue closed");
}

async fn execute(
    session: &Arc<dyn RouterSession>,
    path: &str,
    params: &[String],
) -> Result<Vec<Row>> {
    match AssertUnwindSafe(session.write(path, params))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Command {} panicked: {}", path, detail);
            Err(AppError::Command(format!("Command {path} panicked: {detail}")))
        }
    }
}

fn outcome(result: &Result<Vec<Row>>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(AppError::Command(_)) => "command_error",
        Err(e) if e.is_connection() => "connection_error",
        Err(_) => "error",
    }
}
