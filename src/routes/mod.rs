// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::{Any, CorsLayer};

use crate::charts::ChartRegistry;
use crate::models::DashboardFrame;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) frames_tx: broadcast::Sender<DashboardFrame>,
    pub(crate) latest: Arc<RwLock<Option<DashboardFrame>>>,
    pub(crate) registry: Arc<ChartRegistry>,
    pub(crate) ws_dashboard_connections: Arc<AtomicUsize>,
}

pub fn app(
    frames_tx: broadcast::Sender<DashboardFrame>,
    latest: Arc<RwLock<Option<DashboardFrame>>>,
    registry: Arc<ChartRegistry>,
    ws_dashboard_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        frames_tx,
        latest,
        registry,
        ws_dashboard_connections,
    };
    Router::new()
        .route("/", get(|| async { "pcpview: live PCP charts" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/charts", get(http::charts_handler)) // GET /api/charts
        .route("/api/charts/{id}", get(http::chart_handler)) // GET /api/charts/{id}
        .route("/api/charts/{id}/metrics", get(http::chart_metrics_handler)) // GET /api/charts/{id}/metrics
        .route("/api/dashboard", get(http::dashboard_handler)) // GET /api/dashboard
        .route("/ws/dashboard", get(ws::ws_dashboard)) // WS /ws/dashboard
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
