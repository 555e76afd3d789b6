use std::net::SocketAddr;
use std::sync::Arc;

use mikrotik_dashboard::{
    AppState, Config, ConnectionManager, MetricsRegistry, Result, TcpConnector, create_router,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    // Missing or malformed settings are fatal; nothing to retry
    let config = Config::from_env().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    tracing::info!(
        "Router {} as '{}' (timeout {:?}, keepalive {:?})",
        config.router.address(),
        config.router.username,
        config.router.timeout,
        config.router.keepalive_interval
    );

    let metrics = MetricsRegistry::new();
    let manager = ConnectionManager::start(
        config.router.clone(),
        Arc::new(TcpConnector),
        metrics.clone(),
    );

    // Best effort: the first request retries if the router is not up yet
    if let Err(e) = manager.connect().await {
        tracing::warn!("Initial connection failed: {}", e);
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        manager: manager.clone(),
        metrics,
    });

    // Канал завершения (graceful shutdown)
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("MikroTik dashboard backend starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health               - Connection health");
    tracing::info!("  - GET  /metrics              - Prometheus metrics");
    tracing::info!("  - GET  /api/router/status    - Identity and resources");
    tracing::info!("  - GET  /api/interfaces       - Interfaces");
    tracing::info!("  - GET  /api/identity         - Router identity");
    tracing::info!("  - GET  /api/routes           - IP routes");
    tracing::info!("  - GET  /api/firewall/filter  - Firewall filter rules");
    tracing::info!("  - POST /api/command          - Raw API command");
    tracing::info!("  - POST /api/terminal         - Terminal command");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    manager.stop().await;
    Ok(())
}

fn setup_tracing() {
    // RUST_LOG wins; "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
