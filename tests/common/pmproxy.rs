// Stub pmproxy: the pmwebapi endpoints the client uses, on a local listener

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use pcpview::pmapi::PmApiClient;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The only context id the stub knows; any other id gets a 400.
pub const CONTEXT: u64 = 348_734;

/// Metrics the stub exports. `disk.dev.write` reports instance 2, which its
/// instance domain never names.
pub const EXPORTED: &[&str] = &[
    "disk.dev.read",
    "disk.dev.write",
    "mem.physmem",
    "pmcd.hostname",
    "containers.name",
    "containers.cgroup",
];

#[derive(Default)]
pub struct StubPmproxy {
    /// Status numeric `_fetch` requests answer with; 0 means 200.
    pub fetch_status: AtomicU16,
    pub contexts_created: AtomicU64,
    pub numeric_fetches: AtomicU64,
    pub indom_requests: AtomicU64,
    pub stores: Mutex<Vec<(String, String)>>,
}

pub type Stub = Arc<StubPmproxy>;
type Params = Query<HashMap<String, String>>;

fn known(ctx: u64) -> Result<(), StatusCode> {
    if ctx == CONTEXT {
        Ok(())
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

async fn context(State(stub): State<Stub>) -> Json<Value> {
    stub.contexts_created.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "context": CONTEXT }))
}

async fn metric(Path(ctx): Path<u64>) -> Result<Json<Value>, StatusCode> {
    known(ctx)?;
    let metrics: Vec<Value> = EXPORTED.iter().map(|name| json!({ "name": name })).collect();
    Ok(Json(json!({ "metrics": metrics })))
}

fn strings(name: &str, values: &[(Option<i32>, &str)]) -> Json<Value> {
    let instances: Vec<Value> = values
        .iter()
        .map(|(instance, value)| json!({ "instance": instance, "value": value }))
        .collect();
    Json(json!({
        "timestamp": { "s": 1, "us": 0 },
        "values": [{ "name": name, "instances": instances }]
    }))
}

async fn fetch(
    State(stub): State<Stub>,
    Path(ctx): Path<u64>,
    Query(params): Params,
) -> Result<Json<Value>, StatusCode> {
    known(ctx)?;
    let names = params.get("names").cloned().unwrap_or_default();
    match names.as_str() {
        "pmcd.hostname" => return Ok(strings(&names, &[(None, "box")])),
        "containers.name" => return Ok(strings(&names, &[(Some(0), "web")])),
        "containers.cgroup" => return Ok(strings(&names, &[(Some(0), "/docker/abc")])),
        _ => {}
    }

    let status = stub.fetch_status.load(Ordering::SeqCst);
    if status != 0 {
        return Err(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
    }
    let n = stub.numeric_fetches.fetch_add(1, Ordering::SeqCst) + 1;
    let values: Vec<Value> = names
        .split(',')
        .filter_map(|name| {
            let instances = match name {
                "disk.dev.read" => json!([
                    { "instance": 0, "value": n * 10 },
                    { "instance": 1, "value": n * 20 }
                ]),
                "disk.dev.write" => json!([{ "instance": 2, "value": n }]),
                "mem.physmem" => json!([{ "instance": null, "value": 8192 }]),
                _ => return None,
            };
            Some(json!({ "name": name, "instances": instances }))
        })
        .collect();
    Ok(Json(json!({
        "timestamp": { "s": n, "us": 0 },
        "values": values
    })))
}

async fn indom(
    State(stub): State<Stub>,
    Path(ctx): Path<u64>,
    Query(params): Params,
) -> Result<Json<Value>, StatusCode> {
    known(ctx)?;
    stub.indom_requests.fetch_add(1, Ordering::SeqCst);
    let instances = match params.get("name").map(String::as_str) {
        Some("disk.dev.read") => json!([
            { "instance": 0, "name": "sda" },
            { "instance": 1, "name": "sdb" }
        ]),
        _ => json!([]),
    };
    Ok(Json(json!({ "instances": instances })))
}

async fn store(
    State(stub): State<Stub>,
    Path(ctx): Path<u64>,
    Query(params): Params,
) -> Result<Json<Value>, StatusCode> {
    known(ctx)?;
    let name = params.get("name").cloned().unwrap_or_default();
    let value = params.get("value").cloned().unwrap_or_default();
    stub.stores.lock().unwrap().push((name, value));
    Ok(Json(json!({ "success": true })))
}

/// Serves the stub on an ephemeral port and returns a client pointed at it.
pub async fn spawn() -> (Stub, PmApiClient) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/pmapi/context", get(context))
        .route("/pmapi/{ctx}/_metric", get(metric))
        .route("/pmapi/{ctx}/_fetch", get(fetch))
        .route("/pmapi/{ctx}/_indom", get(indom))
        .route("/pmapi/{ctx}/_store", get(store))
        .with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let client = PmApiClient::with_base_url(
        &format!("http://{}/pmapi", addr),
        Duration::from_secs(5),
    )
    .unwrap();
    (stub, client)
}
