// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Periodic keepalive probe

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::{ConnectionManager, IDENTITY_PATH, Inner};

async fn run(inner: Weak<Inner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let manager = ConnectionManager { inner };

        // Queue-only: a dead session must not be revived from here
        match manager.enqueue(IDENTITY_PATH, Vec::new()).await {
            Ok(_) => tracing::trace!("Keepalive ok"),
            Err(e) => tracing::warn!("Keepalive failed: {}", e),
        }
    }
}

/// Starts probing every `period`, first probe one period from now
pub(super) fn spawn(inner: &Arc<Inner>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(Arc::downgrade(inner), period))
}
