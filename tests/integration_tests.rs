// Integration tests: HTTP and WebSocket endpoints

use axum_test::TestServer;
use pcpview::charts::ChartRegistry;
use pcpview::models::{ChartFrame, DashboardFrame, DataPoint, Instance, LineType, Series, TickFormat};
use pcpview::routes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};

type Latest = Arc<RwLock<Option<DashboardFrame>>>;

fn test_app() -> (axum::Router, broadcast::Sender<DashboardFrame>, Latest) {
    let (tx, _) = broadcast::channel(10);
    let latest: Latest = Arc::new(RwLock::new(None));
    let app = routes::app(
        tx.clone(),
        latest.clone(),
        Arc::new(ChartRegistry::builtin()),
        Arc::new(AtomicUsize::new(0)),
    );
    (app, tx, latest)
}

/// Build TestServer with http_transport (required for WebSocket tests).
fn test_server_with_http() -> (TestServer, broadcast::Sender<DashboardFrame>, Latest) {
    let (app, tx, latest) = test_app();
    let server = TestServer::builder().http_transport().build(app);
    (server, tx, latest)
}

fn sample_frame(timestamp: u64) -> DashboardFrame {
    DashboardFrame {
        timestamp,
        hostname: Some("box".into()),
        container_id: None,
        charts: vec![ChartFrame {
            id: "cpu-load-average".into(),
            group: "CPU".into(),
            title: "Load Average".into(),
            y_tick_format: TickFormat::Number,
            line_type: LineType::Line,
            series: vec![Series::new(
                "kernel.all.load",
                Instance::Name("1 minute".into()),
                vec![DataPoint::new(timestamp, Some(0.5))],
            )],
        }],
    }
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/").await;
    response.assert_status_ok();
    response.assert_text("pcpview: live PCP charts");
}

#[tokio::test]
async fn test_version_endpoint() {
    let (app, _, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("pcpview"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_charts_endpoint_lists_registry() {
    let (app, _, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/api/charts").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    let charts = json.as_array().unwrap();
    assert_eq!(charts.len(), ChartRegistry::builtin().len());
    assert!(charts.iter().all(|c| c.get("metricNames").is_some()));
}

#[tokio::test]
async fn test_chart_endpoint_known_and_unknown() {
    let (app, _, _) = test_app();
    let server = TestServer::new(app);

    let response = server.get("/api/charts/disk-iops").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["id"], "disk-iops");
    assert_eq!(json["transforms"][0]["kind"], "mapInstanceDomains");

    let response = server.get("/api/charts/nope").await;
    response.assert_status_not_found();
    let json: serde_json::Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn test_chart_metrics_endpoint() {
    let (app, _, _) = test_app();
    let server = TestServer::new(app);
    let response = server.get("/api/charts/disk-throughput/metrics").await;
    response.assert_status_ok();
    let names: Vec<String> = response.json();
    assert_eq!(names, vec!["disk.dev.read_bytes", "disk.dev.write_bytes"]);

    server
        .get("/api/charts/nope/metrics")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_dashboard_null_before_first_poll() {
    let (app, _, latest) = test_app();
    let server = TestServer::new(app);
    let json: serde_json::Value = server.get("/api/dashboard").await.json();
    assert!(json.is_null());

    *latest.write().await = Some(sample_frame(42));
    let json: serde_json::Value = server.get("/api/dashboard").await.json();
    assert_eq!(json["timestamp"], 42);
    assert_eq!(json["hostname"], "box");
    assert_eq!(json["charts"][0]["series"][0]["title"], "kernel.all.load (1 minute)");
}

// --- WebSocket message tests (require http_transport + ws feature) ---
// Receive until we get valid JSON (server may send Ping first).

async fn receive_first_json_text<T: serde::de::DeserializeOwned>(
    ws: &mut axum_test::TestWebSocket,
) -> T {
    let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_secs(3);
    loop {
        let text = ws.receive_text().await;
        if let Ok(v) = serde_json::from_str::<T>(&text) {
            return v;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for JSON"
        );
    }
}

#[tokio::test]
async fn test_ws_dashboard_receives_broadcast_frame() {
    let (server, tx, _) = test_server_with_http();
    let mut ws = server
        .get_websocket("/ws/dashboard")
        .await
        .into_websocket()
        .await;
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        let _ = tx_clone.send(sample_frame(7));
    });
    let received: serde_json::Value = receive_first_json_text(&mut ws).await;
    assert_eq!(received["timestamp"], 7);
    assert_eq!(received["charts"][0]["id"], "cpu-load-average");
}

#[tokio::test]
async fn test_ws_dashboard_sends_latest_frame_on_connect() {
    let (server, _, latest) = test_server_with_http();
    *latest.write().await = Some(sample_frame(99));
    let mut ws = server
        .get_websocket("/ws/dashboard")
        .await
        .into_websocket()
        .await;
    let received: serde_json::Value = receive_first_json_text(&mut ws).await;
    assert_eq!(received["timestamp"], 99);
}
