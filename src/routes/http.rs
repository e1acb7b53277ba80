// GET handlers: version, chart catalogue, latest dashboard frame

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use super::AppState;
use crate::models::ChartDefinition;
use crate::pipeline::required_metric_names;
use crate::version::{NAME, VERSION};

type NotFound = (StatusCode, Json<Value>);

fn unknown_chart(id: &str) -> NotFound {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("unknown chart id: {}", id) })),
    )
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/charts — every registered chart definition, in display order.
pub(super) async fn charts_handler(State(state): State<AppState>) -> Json<Vec<ChartDefinition>> {
    Json(state.registry.all().to_vec())
}

pub(super) async fn chart_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChartDefinition>, NotFound> {
    state
        .registry
        .find(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| unknown_chart(&id))
}

/// GET /api/charts/{id}/metrics — the metric names the chart needs fetched.
pub(super) async fn chart_metrics_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, NotFound> {
    let chart = state.registry.find(&id).ok_or_else(|| unknown_chart(&id))?;
    Ok(Json(required_metric_names(chart).into_iter().collect()))
}

/// GET /api/dashboard — the most recent frame; `null` until the first poll completes.
pub(super) async fn dashboard_handler(State(state): State<AppState>) -> impl IntoResponse {
    let latest = state.latest.read().await.clone();
    Json(latest)
}
