// Background poller: keeps a pmapi context alive, samples the charts' metrics
// into the window and publishes a computed dashboard frame every tick.

mod state;

pub use state::{INSTANCE_DOMAIN_RETRY, PollerState};

use crate::charts::required_metric_names;
use crate::config::AppConfig;
use crate::models::{ChartDefinition, DashboardFrame};
use crate::pmapi::{CONTAINER_METRIC, ContextId, PmApiClient, PmApiError};
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" message (avoid logging every tick when no one is on /ws/dashboard)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Client, channels, and shutdown for the poller.
pub struct PollerDeps {
    pub client: PmApiClient,
    /// Active charts, in display order.
    pub charts: Vec<ChartDefinition>,
    pub tx: broadcast::Sender<DashboardFrame>,
    pub latest: Arc<RwLock<Option<DashboardFrame>>>,
    pub ws_dashboard_connections: Arc<AtomicUsize>,
    pub frames_published_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Poller timing and target settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub hostspec: String,
    /// Active container filter (already normalised: never empty or `_all`).
    pub container_id: Option<String>,
    pub poll_interval_ms: u64,
    pub context_poll_interval_ms: u64,
    pub window_secs: u64,
    pub context_poll_timeout_secs: u64,
    pub stats_log_interval_secs: u64,
}

impl PollerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            hostspec: config.target.hostspec.clone(),
            container_id: config.container_filter().map(str::to_string),
            poll_interval_ms: config.polling.poll_interval_ms,
            context_poll_interval_ms: config.polling.context_poll_interval_ms,
            window_secs: config.polling.window_secs,
            context_poll_timeout_secs: config.polling.context_poll_timeout_secs,
            stats_log_interval_secs: config.monitoring.stats_log_interval_secs,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_secs.saturating_mul(1000)
    }
}

/// Creates the context if needed, then fills in whatever the context still
/// lacks: metric list, hostname, container scoping. The container list is
/// refreshed on every call.
pub async fn refresh_context(
    client: &PmApiClient,
    state: &mut PollerState,
    config: &PollerConfig,
) -> Result<ContextId, PmApiError> {
    let ctx = match state.context {
        Some(ctx) => ctx,
        None => {
            let ctx = client
                .create_context(&config.hostspec, config.context_poll_timeout_secs)
                .await?;
            tracing::info!(context = ctx, hostspec = %config.hostspec, "pmapi context created");
            state.context = Some(ctx);
            ctx
        }
    };

    if state.known_metrics.is_empty() {
        state.known_metrics = client.metric_names(ctx).await?;
        tracing::debug!(
            operation = "metric_names",
            metrics_count = state.known_metrics.len(),
            "metric list fetched"
        );
    }

    if state.hostname.is_none() {
        state.hostname = client.hostname(ctx).await?;
    }

    if !state.container_scoped
        && let Some(container_id) = config.container_id.as_deref()
    {
        client.store(ctx, CONTAINER_METRIC, container_id).await?;
        state.container_scoped = true;
        tracing::info!(container_id, "context scoped to container");
    }

    state.containers = client.container_list(ctx).await?;
    Ok(ctx)
}

/// Fetches instance names for every metric the newest sample could not fully
/// resolve and that is due for another attempt. Requests run concurrently; a
/// failed one only leaves its ids numeric.
pub async fn resolve_instance_domains(
    client: &PmApiClient,
    state: &mut PollerState,
    ctx: ContextId,
) {
    let metrics = state.instance_domains_due(std::time::Instant::now());
    if metrics.is_empty() {
        return;
    }
    let results = join_all(metrics.iter().map(|m| client.instance_domain(ctx, m))).await;
    for (metric, result) in metrics.iter().zip(results) {
        match result {
            Ok(domain) => state.instance_domains.merge_domain(metric, domain),
            Err(e) => tracing::warn!(
                error = %e,
                operation = "instance_domain",
                metric = %metric,
                "could not fetch instance domain"
            ),
        }
    }
}

/// One sample tick: fetch, store, resolve names. Returns false when there was
/// nothing to fetch.
pub async fn sample(
    client: &PmApiClient,
    state: &mut PollerState,
    config: &PollerConfig,
    required: &BTreeSet<String>,
) -> Result<bool, PmApiError> {
    let ctx = match state.context {
        Some(ctx) => ctx,
        None => refresh_context(client, state, config).await?,
    };
    let requested = state.requested_metrics(required);
    if requested.is_empty() {
        tracing::debug!(operation = "fetch", "no exported metric is required by the active charts");
        return Ok(false);
    }
    let snapshot = client.fetch(ctx, &requested).await?;
    if !state.record(snapshot) {
        tracing::debug!(operation = "fetch", "sample not newer than the window; dropped");
    }
    resolve_instance_domains(client, state, ctx).await;
    Ok(true)
}

/// Logs a failed request; drops the context when pmproxy no longer knows it.
pub fn handle_failure(state: &mut PollerState, e: &PmApiError, operation: &'static str) {
    tracing::warn!(error = %e, operation, "pmapi request failed");
    if e.is_context_lost() {
        tracing::info!(context = ?state.context, "pmapi context lost; will recreate");
        state.reset_context();
    }
}

pub fn spawn(deps: PollerDeps, config: PollerConfig) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        client,
        charts,
        tx,
        latest,
        ws_dashboard_connections,
        frames_published_total,
        mut shutdown_rx,
    } = deps;

    let required = required_metric_names(&charts);
    let stats_log_interval = Duration::from_secs(config.stats_log_interval_secs);
    let poller_span = tracing::span!(
        tracing::Level::DEBUG,
        "poller",
        poll_interval_ms = config.poll_interval_ms
    );

    tokio::spawn(async move {
        let mut state = PollerState::new(config.window_ms());

        let mut tick = interval(Duration::from_millis(config.poll_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut context_tick = interval(Duration::from_millis(config.context_poll_interval_ms));
        context_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = context_tick.tick() => {
                    if let Err(e) = refresh_context(&client, &mut state, &config).await {
                        handle_failure(&mut state, &e, "refresh_context");
                    }
                }
                _ = tick.tick() => {
                    match sample(&client, &mut state, &config, &required).await {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(e) => {
                            handle_failure(&mut state, &e, "fetch");
                            continue;
                        }
                    }

                    let frame = state.frame(&charts, config.container_id.as_deref());
                    *latest.write().await = Some(frame.clone());
                    frames_published_total.fetch_add(1, Ordering::Relaxed);

                    if tx.send(frame).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_frame",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Poller shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        context = ?state.context,
                        window_len = state.window.len(),
                        resolved_metrics = state.instance_domains.metric_count(),
                        containers = state.containers.len(),
                        ws_dashboard_clients = ws_dashboard_connections.load(Ordering::Relaxed),
                        frames_published_total = frames_published_total.load(Ordering::Relaxed),
                        "poller stats"
                    );
                }
            }
        }
    }.instrument(poller_span))
}
