// Integration tests: HTTP and WebSocket endpoints

mod common;

use axum_test::{TestServer, WsMessage};
use common::*;
use homeserver_monitor::evaluator::ThresholdSet;
use homeserver_monitor::models::ContainerUsage;
use homeserver_monitor::monitor::{Monitor, MonitorRegistry, NullSink};
use homeserver_monitor::routes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::time::{Duration, timeout};

fn web_snapshot(ts: u64) -> homeserver_monitor::models::MetricSnapshot {
    let mut s = snapshot(ts, 75.0, 40.0, 30.0);
    s.containers.push(ContainerUsage {
        id: "abc123".into(),
        name: "web".into(),
        cpu_percent: 5.0,
        memory_usage_bytes: 50,
        memory_limit_bytes: 100,
    });
    s
}

/// Registry with one monitor "local" that has ingested one snapshot and was then stopped.
async fn sampled_registry() -> Arc<MonitorRegistry<ScriptedSampler>> {
    let mut registry = MonitorRegistry::new();
    let monitor = Monitor::new(
        "local",
        ScriptedSampler::new(vec![Step::Ok(web_snapshot(1_000))]),
        test_settings(),
        ThresholdSet::default(),
        Arc::new(NullSink),
    )
    .unwrap();
    let monitor = registry.insert(monitor).unwrap();
    let mut rx = monitor.subscribe();
    registry.start_all();
    timeout(Duration::from_secs(3), rx.recv())
        .await
        .expect("first update")
        .unwrap();
    registry.stop_all();
    Arc::new(registry)
}

fn test_app(
    registry: Arc<MonitorRegistry<ScriptedSampler>>,
    metrics_source: Option<ScriptedSampler>,
) -> axum::Router {
    routes::app(
        registry,
        metrics_source.map(Arc::new),
        Arc::new(AtomicUsize::new(0)),
    )
}

#[tokio::test]
async fn test_root_endpoint() {
    let server = TestServer::try_new(test_app(Arc::new(MonitorRegistry::new()), None)).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("Hello from homeserver monitor!");
}

#[tokio::test]
async fn test_version_endpoint() {
    let server = TestServer::try_new(test_app(Arc::new(MonitorRegistry::new()), None)).unwrap();
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("homeserver-monitor")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_metrics_endpoint_serves_snapshot() {
    let source = ScriptedSampler::new(vec![Step::Ok(web_snapshot(7))]);
    let server = TestServer::try_new(test_app(Arc::new(MonitorRegistry::new()), Some(source))).unwrap();
    let response = server.get("/api/metrics").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["timestamp"], 7);
    assert_eq!(json["cpu"]["usagePercent"], 75.0);
    assert_eq!(json["containers"][0]["name"], "web");
}

#[tokio::test]
async fn test_metrics_endpoint_reports_fetch_failure() {
    let source = ScriptedSampler::new(vec![]);
    let server = TestServer::try_new(test_app(Arc::new(MonitorRegistry::new()), Some(source))).unwrap();
    let response = server.get("/api/metrics").await;
    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let json: serde_json::Value = response.json();
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|e| e.contains("script exhausted"))
    );
}

#[tokio::test]
async fn test_metrics_endpoint_disabled() {
    let server = TestServer::try_new(test_app(Arc::new(MonitorRegistry::new()), None)).unwrap();
    server.get("/api/metrics").await.assert_status_not_found();
}

#[tokio::test]
async fn test_list_monitors() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    let response = server.get("/api/monitors").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!([
        { "name": "local", "phase": "stopped", "stale": false }
    ]));
}

#[tokio::test]
async fn test_monitor_status() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    let response = server.get("/api/monitors/local").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["name"], "local");
    assert_eq!(json["stale"], false);
    assert_eq!(json["consecutiveFailures"], 0);
    assert!(json["error"].is_null());
    assert_eq!(json["snapshot"]["timestamp"], 1_000);
    assert_eq!(json["levels"]["cpu"], "warning");
    assert_eq!(json["levels"]["memory"], "normal");
    // No container thresholds configured: container series are not evaluated.
    assert!(json["levels"].get("container/web/cpu").is_none());
}

#[tokio::test]
async fn test_monitor_status_unknown() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    let response = server.get("/api/monitors/nope").await;
    response.assert_status_not_found();
    let json: serde_json::Value = response.json();
    assert!(json["error"].as_str().is_some_and(|e| e.contains("nope")));
}

#[tokio::test]
async fn test_monitor_history_host_series() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    let response = server.get("/api/monitors/local/history/cpu").await;
    response.assert_status_ok();
    response.assert_json(&serde_json::json!({
        "resource": "cpu",
        "order": "oldest-first",
        "capacity": 5,
        "points": [{ "timestamp": 1_000, "value": 75.0 }]
    }));
}

#[tokio::test]
async fn test_monitor_history_container_series_with_limit() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    let response = server
        .get("/api/monitors/local/history/container/web/memory")
        .add_query_param("limit", 1)
        .await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["resource"], "container/web/memory");
    assert_eq!(json["points"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["points"][0]["value"], 50.0);

    let response = server
        .get("/api/monitors/local/history/container/web/cpu")
        .add_query_param("limit", 0)
        .await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["points"], serde_json::json!([]));
}

#[tokio::test]
async fn test_monitor_history_errors() {
    let server = TestServer::try_new(test_app(sampled_registry().await, None)).unwrap();
    server
        .get("/api/monitors/local/history/gpu")
        .await
        .assert_status_bad_request();
    server
        .get("/api/monitors/local/history/container/db/cpu")
        .await
        .assert_status_not_found();
    server
        .get("/api/monitors/nope/history/cpu")
        .await
        .assert_status_not_found();
}

// --- WebSocket message tests (require http_transport + ws feature) ---
// Skip non-text frames (the server pings on connect).

async fn receive_json(ws: &mut axum_test::TestWebSocket) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        let message = timeout(remaining, ws.receive_message())
            .await
            .expect("timed out waiting for JSON");
        if let WsMessage::Text(text) = message
            && let Ok(value) = serde_json::from_str(&text)
        {
            return value;
        }
    }
}

#[tokio::test]
async fn test_ws_monitor_sends_status_first() {
    let server = TestServer::builder()
        .http_transport()
        .try_build(test_app(sampled_registry().await, None))
        .unwrap();
    let mut ws = server
        .get_websocket("/ws/monitors/local")
        .await
        .into_websocket()
        .await;
    let message = receive_json(&mut ws).await;
    assert_eq!(message["type"], "status");
    assert_eq!(message["status"]["name"], "local");
    assert_eq!(message["status"]["snapshot"]["timestamp"], 1_000);
}

#[tokio::test]
async fn test_ws_monitor_streams_updates() {
    let steps = (0..10).map(|i| Step::Ok(cpu_snapshot(i, 95.0))).collect();
    let mut registry = MonitorRegistry::new();
    registry
        .insert(
            Monitor::new(
                "live",
                ScriptedSampler::new(steps),
                test_settings(),
                ThresholdSet::default(),
                Arc::new(NullSink),
            )
            .unwrap(),
        )
        .unwrap();
    let registry = Arc::new(registry);
    let server = TestServer::builder()
        .http_transport()
        .try_build(test_app(registry.clone(), None))
        .unwrap();

    let mut ws = server
        .get_websocket("/ws/monitors/live")
        .await
        .into_websocket()
        .await;
    let welcome = receive_json(&mut ws).await;
    assert_eq!(welcome["type"], "status");
    assert_eq!(welcome["status"]["phase"], "idle");

    registry.start_all();
    let update = receive_json(&mut ws).await;
    registry.stop_all();
    assert_eq!(update["type"], "update");
    assert_eq!(update["update"]["stale"], false);
    assert_eq!(update["update"]["alerts"][0]["level"], "danger");
}

#[tokio::test]
async fn test_ws_unknown_monitor_is_not_found() {
    let server = TestServer::builder()
        .http_transport()
        .try_build(test_app(Arc::new(MonitorRegistry::new()), None))
        .unwrap();
    server
        .get_websocket("/ws/monitors/nope")
        .await
        .assert_status_not_found();
}
