// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use mikrotik_dashboard::{
    AppError, AppState, CloseSignal, Config, ConnectionManager, Connector, MetricsRegistry,
    Result, RouterSession, RouterSettings, Row, create_router,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tower::ServiceExt;

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Canned replies for the paths the dashboard reads
struct LabSession {
    closed_tx: watch::Sender<Option<String>>,
}

#[async_trait]
impl RouterSession for LabSession {
    async fn write(&self, path: &str, params: &[String]) -> Result<Vec<Row>> {
        match path {
            "/system/identity/print" => Ok(vec![row(&[("name", "lab-router")])]),
            "/system/resource/print" => Ok(vec![row(&[
                ("uptime", "2d3h"),
                ("version", "7.15 (stable)"),
                ("board-name", "hAP ax3"),
                ("cpu-load", "3"),
                ("free-memory", "768MiB"),
                ("total-memory", "1GiB"),
            ])]),
            "/interface/print" => Ok(vec![row(&[
                (".id", "*1"),
                ("name", "ether1"),
                ("type", "ether"),
                ("running", "true"),
            ])]),
            "/ip/route/print" => Ok(vec![row(&[
                (".id", "*A"),
                ("dst-address", "0.0.0.0/0"),
                ("gateway", "10.0.0.1"),
                ("active", "true"),
            ])]),
            "/ip/firewall/filter/print" => Ok(vec![row(&[
                (".id", "*3"),
                ("chain", "input"),
                ("action", "accept"),
            ])]),
            "/ip/address/print" => Ok(vec![row(&[
                (".id", "*7"),
                ("address", "10.0.0.2/24"),
                ("interface", "ether1"),
                ("query", &params.join(" ")),
            ])]),
            _ => Err(AppError::Command("no such command prefix".to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn closed(&self) -> CloseSignal {
        self.closed_tx.subscribe()
    }
}

#[derive(Default)]
struct LabConnector {
    refuse: bool,
    connects: AtomicUsize,
}

#[async_trait]
impl Connector for LabConnector {
    async fn connect(&self, _settings: &RouterSettings) -> Result<Arc<dyn RouterSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(AppError::Connection("connection refused".to_string()));
        }
        let (closed_tx, _) = watch::channel(None);
        Ok(Arc::new(LabSession { closed_tx }))
    }
}

fn make_state(connector: Arc<LabConnector>) -> Arc<AppState> {
    let settings = RouterSettings::new("192.0.2.10");
    let config = Config {
        server_addr: "127.0.0.1:3000".to_string(),
        router: settings.clone(),
    };
    let metrics = MetricsRegistry::new();
    let manager = ConnectionManager::start(settings, connector, metrics.clone());
    Arc::new(AppState {
        config,
        manager,
        metrics,
    })
}

fn lab() -> Arc<AppState> {
    make_state(Arc::new(LabConnector::default()))
}

async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

async fn get_json(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(state, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(state: &Arc<AppState>, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(state, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

// --- /health ---

#[tokio::test]
async fn health_reports_disconnected_before_first_use() {
    let state = lab();
    let (status, json) = get_json(&state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["state"], "disconnected");
    assert_eq!(json["connected"], false);
    assert_eq!(json["host"], "192.0.2.10");
    assert_eq!(json["port"], 8728);
    assert_eq!(json["listen_addr"], "127.0.0.1:3000");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_reports_identity_once_connected() {
    let state = lab();
    state.manager.connect().await.unwrap();

    let (status, json) = get_json(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["connected"], true);
    assert_eq!(json["router_identity"], "lab-router");
    assert!(json["connected_since"].is_u64());
}

#[tokio::test]
async fn health_shows_last_error_after_failed_connect() {
    let state = make_state(Arc::new(LabConnector {
        refuse: true,
        ..Default::default()
    }));
    assert!(state.manager.connect().await.is_err());

    let (_, json) = get_json(&state, "/health").await;
    assert_eq!(json["last_error"], "connection refused");
}

// --- /metrics ---

#[tokio::test]
async fn metrics_returns_openmetrics_text() {
    let state = lab();
    state.manager.get_interfaces().await.unwrap();

    let resp = create_router(state)
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(ct.contains("openmetrics-text"), "got: {ct}");

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("routeros_connected 1"));
    assert!(text.contains(r#"routeros_cache_requests_total{key="interfaces",result="miss"} 1"#));
}

// --- cached getters ---

#[tokio::test]
async fn router_status_combines_identity_and_resources() {
    let state = lab();
    let (status, json) = get_json(&state, "/api/router/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["identity"], "lab-router");
    assert_eq!(json["resource"]["board_name"], "hAP ax3");
    assert_eq!(json["resource"]["uptime_seconds"], 183_600);
    assert_eq!(json["memory_used_percent"], 25.0);
}

#[tokio::test]
async fn read_endpoints_return_typed_rows() {
    let state = lab();

    let (status, interfaces) = get_json(&state, "/api/interfaces").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(interfaces[0]["name"], "ether1");
    assert_eq!(interfaces[0]["running"], true);

    let (_, identity) = get_json(&state, "/api/identity").await;
    assert_eq!(identity["identity"], "lab-router");

    let (_, routes) = get_json(&state, "/api/routes").await;
    assert_eq!(routes[0]["dst_address"], "0.0.0.0/0");
    assert_eq!(routes[0]["gateway"], "10.0.0.1");

    let (_, rules) = get_json(&state, "/api/firewall/filter").await;
    assert_eq!(rules[0]["chain"], "input");
    assert_eq!(rules[0]["action"], "accept");
}

#[tokio::test]
async fn unreachable_router_maps_to_503() {
    let connector = Arc::new(LabConnector {
        refuse: true,
        ..Default::default()
    });
    let state = make_state(connector.clone());

    let (status, json) = get_json(&state, "/api/interfaces").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
}

// --- commands ---

#[tokio::test]
async fn command_returns_raw_rows() {
    let state = lab();
    let (status, json) = post_json(
        &state,
        "/api/command",
        &json!({"path": "/ip/address/print", "params": ["?interface=ether1"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0][".id"], "*7");
    assert_eq!(json[0]["query"], "?interface=ether1");
}

#[tokio::test]
async fn command_trap_maps_to_502() {
    let state = lab();
    let (status, json) =
        post_json(&state, "/api/command", &json!({"path": "/no/such/thing"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("no such command"));
    assert!(state.manager.is_connected());
}

#[tokio::test]
async fn terminal_formats_rows() {
    let state = lab();
    let (status, json) = post_json(
        &state,
        "/api/terminal",
        &json!({"command": "/ip address print where disabled=no"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["output"],
        "address: 10.0.0.2/24\ninterface: ether1\nquery: ?disabled=no"
    );
}

#[tokio::test]
async fn terminal_parse_error_maps_to_400() {
    let connector = Arc::new(LabConnector::default());
    let state = make_state(connector.clone());
    let (status, json) =
        post_json(&state, "/api/terminal", &json!({"command": "ip address print"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Parse error"));
    assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let state = lab();
    let (status, _) = send(
        &state,
        Request::get("/nonexistent").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
