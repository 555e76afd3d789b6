// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS connection manager
//!
//! Owns the one live session to the router. Callers go through
//! [`ConnectionManager::execute_command`] and the cached getters; the manager
//! serializes every wire call through a FIFO queue, shares a single connect
//! attempt between concurrent callers, and rebuilds the session with bounded
//! exponential backoff when it dies underneath them.

mod cache;
mod keepalive;
mod queue;
mod reconnect;
mod terminal;


use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::RouterSettings;
use crate::error::{AppError, Result};
use crate::metrics::MetricsRegistry;
use crate::mikrotik::{
    CloseSignal, Connector, FirewallRule, InterfaceInfo, Route, RouterSession, RouterStatus, Row,
    parse_firewall_rules, parse_identity, parse_interfaces, parse_routes, parse_system,
};
use cache::ResponseCache;
use queue::QueuedCommand;

pub use reconnect::{BACKOFF, backoff_delay};
pub use terminal::{EMPTY_OUTPUT, TerminalCommand, format_rows};

/// Cache keys and TTLs of the typed getters
pub mod cache_keys {
    use std::time::Duration;

    pub const ROUTER_STATUS: &str = "router-status";
    pub const INTERFACES: &str = "interfaces";
    pub const IDENTITY: &str = "identity";
    pub const ROUTES: &str = "routes";
    pub const FIREWALL_FILTER: &str = "firewall-filter";

    pub const ROUTER_STATUS_TTL: Duration = Duration::from_secs(3);
    pub const INTERFACES_TTL: Duration = Duration::from_secs(5);
    pub const IDENTITY_TTL: Duration = Duration::from_secs(30);
    pub const ROUTES_TTL: Duration = Duration::from_secs(10);
    pub const FIREWALL_FILTER_TTL: Duration = Duration::from_secs(10);
}

const IDENTITY_PATH: &str = "/system/identity/print";
const RESOURCE_PATH: &str = "/system/resource/print";
const INTERFACES_PATH: &str = "/interface/print";
const ROUTES_PATH: &str = "/ip/route/print";
const FIREWALL_FILTER_PATH: &str = "/ip/firewall/filter/print";

/// Lifecycle state of the router session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Point-in-time view of the connection, safe to serve without touching the wire
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub state: ConnectionState,
    pub connected: bool,
    /// Unix timestamp (seconds) of the current session's login
    pub connected_since: Option<u64>,
    pub last_error: Option<String>,
    pub router_identity: Option<String>,
    pub host: String,
    pub port: u16,
    pub reconnect_attempts: u32,
}

#[derive(Debug, Default)]
struct ConnState {
    state: ConnectionState,
    connected_since: Option<SystemTime>,
    last_error: Option<String>,
    router_identity: Option<String>,
    reconnect_attempts: u32,
    reconnecting: bool,
    /// Bumped whenever a session is installed or torn down on purpose
    generation: u64,
}

#[derive(Default)]
struct Tasks {
    keepalive: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
    close_watcher: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(self) {
        for handle in [self.keepalive, self.reconnect, self.close_watcher]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

type SessionSlot = Arc<Mutex<Option<Arc<dyn RouterSession>>>>;
type ConnectFlight = Shared<BoxFuture<'static, std::result::Result<(), String>>>;

struct Inner {
    settings: RwLock<RouterSettings>,
    connector: Arc<dyn Connector>,
    session: SessionSlot,
    state: Mutex<ConnState>,
    queue: mpsc::UnboundedSender<QueuedCommand>,
    cache: ResponseCache,
    pending_connect: Mutex<Option<(u64, ConnectFlight)>>,
    flight_seq: AtomicU64,
    tasks: Mutex<Tasks>,
    drain: Mutex<Option<JoinHandle<()>>>,
    metrics: MetricsRegistry,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connection-level errors travel as their bare message so callers sharing
/// a connect attempt see the same text the first caller would have
fn flight_message(error: AppError) -> String {
    match error {
        AppError::Connection(message) => message,
        other => other.to_string(),
    }
}

/// Handle to the connection manager; cheap to clone
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Creates the manager and spawns its command queue
    ///
    /// Must be called from within a Tokio runtime. No connection is opened
    /// until the first command or an explicit [`connect`](Self::connect).
    pub fn start(
        settings: RouterSettings,
        connector: Arc<dyn Connector>,
        metrics: MetricsRegistry,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let session: SessionSlot = Arc::default();
        let drain = tokio::spawn(queue::drain(rx, session.clone(), metrics.clone()));

        tracing::info!(
            "Connection manager started for {} (keepalive {:?}, max {} reconnect attempts)",
            settings.address(),
            settings.keepalive_interval,
            settings.max_reconnect_attempts
        );

        Self {
            inner: Arc::new(Inner {
                settings: RwLock::new(settings),
                connector,
                session,
                state: Mutex::new(ConnState::default()),
                queue: tx,
                cache: ResponseCache::new(metrics.clone()),
                pending_connect: Mutex::new(None),
                flight_seq: AtomicU64::new(0),
                tasks: Mutex::new(Tasks::default()),
                drain: Mutex::new(Some(drain)),
                metrics,
            }),
        }
    }

    /// Disconnects and shuts the command queue down
    ///
    /// Commands issued afterwards fail with a connection error.
    pub async fn stop(&self) {
        self.disconnect("manager stopped").await;
        if let Some(drain) = lock(&self.inner.drain).take() {
            drain.abort();
        }
        tracing::info!("Connection manager stopped");
    }

    /// Disconnects, swaps the router settings and resets all counters
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if the new settings are invalid; the old
    /// settings and connection are then left untouched.
    pub async fn reconfigure(&self, settings: RouterSettings) -> Result<()> {
        settings.validate().map_err(AppError::Config)?;
        self.disconnect("reconfigured").await;
        tracing::info!("Router settings changed to {}", settings.address());
        *self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
        Ok(())
    }

    /// Current router settings
    #[must_use]
    pub fn settings(&self) -> RouterSettings {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ConnState) -> R) -> R {
        f(&mut lock(&self.inner.state))
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.with_state(|st| st.state)
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Opens the session if needed
    ///
    /// Concurrent callers share one in-flight attempt and its outcome.
    /// Succeeds immediately when already connected.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connection`] when the handshake fails or times out.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        if lock(&self.inner.drain).is_none() {
            return Err(AppError::Connection(
                "Connection manager is stopped".to_string(),
            ));
        }

        let flight = {
            let mut pending = lock(&self.inner.pending_connect);
            match pending.as_ref() {
                Some((_, flight)) => {
                    tracing::debug!("Joining connection attempt already in flight");
                    flight.clone()
                }
                None => {
                    let id = self.inner.flight_seq.fetch_add(1, Ordering::Relaxed);
                    let manager = self.clone();
                    let flight = async move {
                        let result = manager.establish().await.map_err(flight_message);
                        let mut pending = lock(&manager.inner.pending_connect);
                        if pending.as_ref().is_some_and(|(current, _)| *current == id) {
                            pending.take();
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *pending = Some((id, flight.clone()));
                    flight
                }
            }
        };

        flight.await.map_err(AppError::Connection)
    }

    async fn establish(&self) -> Result<()> {
        let settings = self.settings();
        let addr = settings.address();

        let start_generation = {
            let mut st = lock(&self.inner.state);
            if st.state == ConnectionState::Connected {
                return Ok(());
            }
            if st.state == ConnectionState::Disconnected {
                st.state = ConnectionState::Connecting;
            }
            st.generation
        };

        tracing::info!("Connecting to RouterOS at {}", addr);
        let started = tokio::time::Instant::now();
        let outcome =
            match tokio::time::timeout(settings.timeout, self.inner.connector.connect(&settings))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(AppError::Connection(format!(
                    "Connection to {addr} timed out after {:?}",
                    settings.timeout
                ))),
            };

        let session = match outcome {
            Ok(session) => session,
            Err(e) => {
                let message = flight_message(e);
                self.inner.metrics.record_connect_attempt(false);
                self.with_state(|st| {
                    st.state = if st.reconnecting {
                        ConnectionState::Reconnecting
                    } else {
                        ConnectionState::Disconnected
                    };
                    st.connected_since = None;
                    st.last_error = Some(message.clone());
                });
                tracing::warn!("Failed to connect to {}: {}", addr, message);
                return Err(AppError::Connection(message));
            }
        };

        let closed = session.closed();
        let installed = self.with_state(|st| {
            if st.generation != start_generation {
                return None;
            }
            st.generation += 1;
            st.state = ConnectionState::Connected;
            st.connected_since = Some(SystemTime::now());
            st.last_error = None;
            st.reconnect_attempts = 0;
            *lock(&self.inner.session) = Some(session.clone());
            Some(st.generation)
        });

        let Some(generation) = installed else {
            tracing::info!("Disconnected while connecting to {}, closing new session", addr);
            if let Err(e) = session.close().await {
                tracing::debug!("Error closing abandoned session: {}", e);
            }
            return Err(AppError::Connection(
                "Connection attempt cancelled by disconnect".to_string(),
            ));
        };

        self.inner.metrics.record_connect_attempt(true);
        self.inner.metrics.set_connected(true);
        tracing::info!(
            "Connected to RouterOS at {} in {:?}",
            addr,
            started.elapsed()
        );

        self.watch_session(generation, closed);
        {
            let mut tasks = lock(&self.inner.tasks);
            if let Some(old) = tasks.keepalive.take() {
                old.abort();
            }
            tasks.keepalive = Some(keepalive::spawn(&self.inner, settings.keepalive_interval));
        }

        match self.fetch_identity().await {
            Ok(identity) => tracing::info!("Router identity: {}", identity),
            Err(e) => tracing::warn!("Could not fetch router identity: {}", e),
        }
        Ok(())
    }

    fn watch_session(&self, generation: u64, mut closed: CloseSignal) {
        let inner = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let reason = match closed.wait_for(Option::is_some).await {
                Ok(reason) => reason.clone().unwrap_or_default(),
                Err(_) => "Session dropped".to_string(),
            };
            if let Some(inner) = inner.upgrade() {
                ConnectionManager { inner }.handle_session_closed(generation, &reason);
            }
        });

        if let Some(old) = lock(&self.inner.tasks).close_watcher.replace(handle) {
            old.abort();
        }
    }

    /// Reacts to the death of the session installed as `generation`
    fn handle_session_closed(&self, generation: u64, reason: &str) {
        let transition = self.with_state(|st| {
            if st.generation != generation || st.state != ConnectionState::Connected {
                return None;
            }
            st.state = ConnectionState::Reconnecting;
            st.connected_since = None;
            st.last_error = Some(reason.to_string());
            let start_loop = !st.reconnecting;
            st.reconnecting = true;
            Some((lock(&self.inner.session).take(), start_loop))
        });

        let Some((session, start_loop)) = transition else {
            tracing::debug!("Ignoring close of stale session: {}", reason);
            return;
        };
        drop(session);

        tracing::warn!("RouterOS session closed unexpectedly: {}", reason);
        let mut tasks = lock(&self.inner.tasks);
        if let Some(keepalive) = tasks.keepalive.take() {
            keepalive.abort();
        }
        tasks.close_watcher.take();
        self.inner.cache.clear();
        self.inner.metrics.record_unexpected_disconnect();
        self.inner.metrics.set_connected(false);

        if start_loop {
            if let Some(old) = tasks.reconnect.replace(reconnect::spawn(&self.inner)) {
                old.abort();
            }
        }
    }

    /// Closes the session and stops all background work
    ///
    /// Resets connection state and clears the cache. Never fails; safe to
    /// call any number of times.
    pub async fn disconnect(&self, reason: &str) {
        std::mem::take(&mut *lock(&self.inner.tasks)).abort_all();
        lock(&self.inner.pending_connect).take();

        let (session, was_active) = self.with_state(|st| {
            let was_active = st.state != ConnectionState::Disconnected;
            *st = ConnState {
                generation: st.generation + 1,
                ..ConnState::default()
            };
            (lock(&self.inner.session).take(), was_active)
        });
        self.inner.cache.clear();
        self.inner.metrics.set_connected(false);

        if let Some(session) = session {
            if let Err(e) = session.close().await {
                tracing::warn!("Error while closing RouterOS session: {}", e);
            }
        }
        if was_active {
            tracing::info!("Disconnected from RouterOS: {}", reason);
        }
    }

    /// Runs a raw API command, connecting first if needed
    ///
    /// # Errors
    ///
    /// [`AppError::Parse`] for a path without a leading `/`,
    /// [`AppError::Connection`] if no session can be established or it dies
    /// mid-command, [`AppError::Command`] if the router rejects the command.
    pub async fn execute_command(&self, path: &str, params: &[String]) -> Result<Vec<Row>> {
        if !path.starts_with('/') {
            return Err(AppError::Parse(format!(
                "Command path must start with '/': '{path}'"
            )));
        }
        self.connect().await?;
        self.enqueue(path, params.to_vec()).await
    }

    /// Runs a CLI-style command and renders the reply as text
    pub async fn execute_terminal_command(&self, command: &str) -> Result<String> {
        let parsed = TerminalCommand::parse(command)?;
        let words = parsed.api_words()?;
        tracing::debug!(
            "Terminal '{}' -> {} {:?}",
            command.trim(),
            parsed.path,
            words
        );
        let rows = self.execute_command(&parsed.path, &words).await?;
        Ok(format_rows(&rows))
    }

    /// Puts a command on the queue without touching connection state
    async fn enqueue(&self, path: &str, params: Vec<String>) -> Result<Vec<Row>> {
        let (responder, reply) = oneshot::channel();
        self.inner.metrics.command_enqueued();
        let command = QueuedCommand {
            path: path.to_string(),
            params,
            responder,
        };
        if self.inner.queue.send(command).is_err() {
            self.inner.metrics.command_dequeued();
            return Err(AppError::Connection("Command queue is closed".to_string()));
        }
        reply.await.map_err(|_| {
            AppError::Connection(format!("Command {path} was dropped before completion"))
        })?
    }

    /// Returns the value cached under `key`, fetching it when older than `ttl`
    ///
    /// Concurrent misses on the same key share one fetch. Errors are
    /// returned to the caller and never cached.
    pub async fn get_cached<T, F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.inner.cache.get_or_fetch(key, ttl, fetcher).await
    }

    async fn fetch_identity(&self) -> Result<String> {
        let identity = self
            .get_cached(cache_keys::IDENTITY, cache_keys::IDENTITY_TTL, move || async move {
                let rows = self.enqueue(IDENTITY_PATH, Vec::new()).await?;
                parse_identity(&rows).ok_or_else(|| {
                    AppError::Command("Identity reply carried no name".to_string())
                })
            })
            .await?;
        self.with_state(|st| st.router_identity = Some(identity.clone()));
        Ok(identity)
    }

    pub async fn get_identity(&self) -> Result<String> {
        self.connect().await?;
        self.fetch_identity().await
    }

    /// Identity plus system resources
    pub async fn get_router_status(&self) -> Result<RouterStatus> {
        self.get_cached(
            cache_keys::ROUTER_STATUS,
            cache_keys::ROUTER_STATUS_TTL,
            move || async move {
                let identity = self.get_identity().await?;
                let rows = self.execute_command(RESOURCE_PATH, &[]).await?;
                let resource = parse_system(&rows);
                Ok(RouterStatus {
                    identity,
                    memory_used_percent: resource.memory_used_percent(),
                    resource,
                })
            },
        )
        .await
    }

    pub async fn get_interfaces(&self) -> Result<Vec<InterfaceInfo>> {
        self.get_cached(cache_keys::INTERFACES, cache_keys::INTERFACES_TTL, move || async move {
            let rows = self.execute_command(INTERFACES_PATH, &[]).await?;
            Ok(parse_interfaces(&rows))
        })
        .await
    }

    pub async fn get_routes(&self) -> Result<Vec<Route>> {
        self.get_cached(cache_keys::ROUTES, cache_keys::ROUTES_TTL, move || async move {
            let rows = self.execute_command(ROUTES_PATH, &[]).await?;
            Ok(parse_routes(&rows))
        })
        .await
    }

    pub async fn get_firewall_rules(&self) -> Result<Vec<FirewallRule>> {
        self.get_cached(
            cache_keys::FIREWALL_FILTER,
            cache_keys::FIREWALL_FILTER_TTL,
            move || async move {
                let rows = self.execute_command(FIREWALL_FILTER_PATH, &[]).await?;
                Ok(parse_firewall_rules(&rows))
            },
        )
        .await
    }

    /// Snapshot with an opportunistic identity refresh when connected
    ///
    /// The refresh goes through the queue and may wait behind other
    /// commands; race this against a timeout and fall back to
    /// [`snapshot`](Self::snapshot).
    pub async fn health_check(&self) -> HealthSnapshot {
        if self.is_connected() {
            if let Err(e) = self.fetch_identity().await {
                tracing::debug!("Identity refresh during health check failed: {}", e);
            }
        }
        self.snapshot()
    }

    /// Current connection status without any I/O
    #[must_use]
    pub fn snapshot(&self) -> HealthSnapshot {
        let settings = self.settings();
        self.with_state(|st| HealthSnapshot {
            state: st.state,
            connected: st.state == ConnectionState::Connected,
            connected_since: st
                .connected_since
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
            last_error: st.last_error.clone(),
            router_identity: st.router_identity.clone(),
            host: settings.host,
            port: settings.port,
            reconnect_attempts: st.reconnect_attempts,
        })
    }
}
