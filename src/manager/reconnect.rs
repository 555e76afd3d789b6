// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Bounded exponential-backoff reconnection after an unexpected close

use std::sync::{Arc, Weak};
use std::time::Duration;

use super::{ConnectionManager, ConnectionState, Inner};

/// Delay before each reconnect attempt; the last entry repeats
pub const BACKOFF: [Duration; 6] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
    Duration::from_secs(8),
    Duration::from_secs(16),
    Duration::from_secs(30),
];

/// Backoff delay after `attempts` failed attempts
#[must_use]
pub fn backoff_delay(attempts: u32) -> Duration {
    let index = usize::try_from(attempts).map_or(BACKOFF.len() - 1, |i| i.min(BACKOFF.len() - 1));
    BACKOFF[index]
}

fn upgrade(inner: &Weak<Inner>) -> Option<ConnectionManager> {
    inner.upgrade().map(|inner| ConnectionManager { inner })
}

/// What the loop does after each wait
enum Step {
    Restored,
    Exhausted(u32),
    Attempt(u32),
}

/// Ends the loop if the session is back, releasing the `reconnecting` flag
fn finish_if_connected(manager: &ConnectionManager) -> bool {
    manager.with_state(|st| {
        if st.state == ConnectionState::Connected {
            st.reconnecting = false;
            true
        } else {
            false
        }
    })
}

fn give_up(manager: &ConnectionManager, attempts: u32) {
    tracing::warn!(
        "Giving up on reconnecting to {} after {} attempts",
        manager.settings().address(),
        attempts
    );
    manager.with_state(|st| {
        st.state = ConnectionState::Disconnected;
        st.reconnecting = false;
    });
}

/// Retries `connect` until it succeeds or the attempt budget is spent
///
/// The loop owns the `reconnecting` flag from spawn until it returns, so a
/// close that lands while it waits never starts a second loop. Holds only a
/// weak reference between attempts so a dropped manager ends the loop.
pub(super) async fn run(inner: Weak<Inner>) {
    loop {
        let Some(manager) = upgrade(&inner) else {
            return;
        };
        let max_attempts = manager.settings().max_reconnect_attempts;
        let attempts = manager.with_state(|st| st.reconnect_attempts);

        if attempts >= max_attempts {
            give_up(&manager, attempts);
            return;
        }

        let delay = backoff_delay(attempts);
        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            attempts + 1,
            max_attempts
        );
        drop(manager);
        tokio::time::sleep(delay).await;

        let Some(manager) = upgrade(&inner) else {
            return;
        };
        let max_attempts = manager.settings().max_reconnect_attempts;
        let step = manager.with_state(|st| {
            if st.state == ConnectionState::Connected {
                st.reconnecting = false;
                Step::Restored
            } else if st.reconnect_attempts >= max_attempts {
                Step::Exhausted(st.reconnect_attempts)
            } else {
                st.reconnect_attempts += 1;
                Step::Attempt(st.reconnect_attempts)
            }
        });
        let attempt = match step {
            Step::Restored => {
                tracing::debug!("Session already restored, stopping reconnect loop");
                return;
            }
            Step::Exhausted(attempts) => {
                give_up(&manager, attempts);
                return;
            }
            Step::Attempt(attempt) => attempt,
        };

        manager.inner.metrics.record_reconnect_attempt();
        match manager.connect().await {
            Ok(()) => tracing::info!("Reconnected after {} attempt(s)", attempt),
            Err(e) => tracing::warn!("Reconnect attempt {} failed: {}", attempt, e),
        }
        // a close during the identity fetch keeps the loop alive
        if finish_if_connected(&manager) {
            return;
        }
    }
}

/// Spawns the reconnect loop on the runtime
pub(super) fn spawn(inner: &Arc<Inner>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(Arc::downgrade(inner)))
}
