use serde::Deserialize;

use crate::models::ChartDefinition;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub target: TargetConfig,
    pub polling: PollingConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Extra chart definitions appended to the built-in catalogue.
    #[serde(default)]
    pub charts: Vec<ChartDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// The pmproxy instance to poll and what it should monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub hostname: String,
    #[serde(default = "default_pmapi_port")]
    pub port: u16,
    #[serde(default = "default_hostspec")]
    pub hostspec: String,
    /// Scopes the context to one container; `_all` or unset shows every container.
    #[serde(default)]
    pub container_id: Option<String>,
}

fn default_pmapi_port() -> u16 {
    7402
}

fn default_hostspec() -> String {
    "localhost".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub poll_interval_ms: u64,
    pub context_poll_interval_ms: u64,
    /// Retention span of the sample window.
    pub window_secs: u64,
    pub request_timeout_ms: u64,
    /// pmproxy drops an idle context after this many seconds.
    #[serde(default = "default_context_poll_timeout_secs")]
    pub context_poll_timeout_secs: u64,
}

fn default_context_poll_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of dashboard frames kept in the broadcast channel for /ws/dashboard (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log poller stats (window length, frames published, ws clients) at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    /// Chart ids to compute, in display order. Empty means every chart.
    #[serde(default)]
    pub charts: Vec<String>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// The configured container filter, `None` when unset, empty or `_all`.
    pub fn container_filter(&self) -> Option<&str> {
        self.target
            .container_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != crate::pipeline::ALL_CONTAINERS)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.target.hostname.is_empty(),
            "target.hostname must be non-empty"
        );
        anyhow::ensure!(
            self.target.port > 0,
            "target.port must be between 1 and 65535, got {}",
            self.target.port
        );
        anyhow::ensure!(
            !self.target.hostspec.is_empty(),
            "target.hostspec must be non-empty"
        );
        anyhow::ensure!(
            self.polling.poll_interval_ms > 0,
            "polling.poll_interval_ms must be > 0, got {}",
            self.polling.poll_interval_ms
        );
        anyhow::ensure!(
            self.polling.context_poll_interval_ms > 0,
            "polling.context_poll_interval_ms must be > 0, got {}",
            self.polling.context_poll_interval_ms
        );
        anyhow::ensure!(
            self.polling.window_secs > 0,
            "polling.window_secs must be > 0, got {}",
            self.polling.window_secs
        );
        anyhow::ensure!(
            self.polling.request_timeout_ms > 0,
            "polling.request_timeout_ms must be > 0, got {}",
            self.polling.request_timeout_ms
        );
        anyhow::ensure!(
            self.polling.context_poll_timeout_secs > 0,
            "polling.context_poll_timeout_secs must be > 0, got {}",
            self.polling.context_poll_timeout_secs
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
