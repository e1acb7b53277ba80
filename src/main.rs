use anyhow::Result;
use pcpview::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize};
use tokio::sync::{RwLock, broadcast};
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let registry = Arc::new(
        charts::ChartRegistry::builtin().with_custom(app_config.charts.clone())?,
    );
    let active_charts = registry.select(&app_config.dashboard.charts)?;
    tracing::info!(
        charts = active_charts.len(),
        metrics = charts::required_metric_names(&active_charts).len(),
        "dashboard configured"
    );

    let client = pmapi::PmApiClient::new(
        &app_config.target.hostname,
        app_config.target.port,
        Duration::from_millis(app_config.polling.request_timeout_ms),
    )?;
    tracing::info!(
        pmapi = client.base_url(),
        hostspec = %app_config.target.hostspec,
        container_id = app_config.container_filter().unwrap_or(pipeline::ALL_CONTAINERS),
        "polling target"
    );

    let (tx, _) =
        broadcast::channel::<models::DashboardFrame>(app_config.publishing.broadcast_capacity);
    let latest = Arc::new(RwLock::new(None));
    let ws_dashboard_connections = Arc::new(AtomicUsize::new(0));
    let frames_published_total = Arc::new(AtomicU64::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let poller_handle = poller::spawn(
        poller::PollerDeps {
            client,
            charts: active_charts,
            tx: tx.clone(),
            latest: latest.clone(),
            ws_dashboard_connections: ws_dashboard_connections.clone(),
            frames_published_total,
            shutdown_rx,
        },
        poller::PollerConfig::from_app_config(&app_config),
    );

    let app = routes::app(tx, latest, registry, ws_dashboard_connections);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = poller_handle.await;
        }
    }

    Ok(())
}
