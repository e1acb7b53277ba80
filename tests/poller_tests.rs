// Poller state tests: request scoping, window bookkeeping, frames

mod common;

use common::{container, poller_config};
use pcpview::charts::{ChartRegistry, required_metric_names};
use pcpview::config::AppConfig;
use pcpview::models::{SINGLETON, Snapshot};
use pcpview::poller::{INSTANCE_DOMAIN_RETRY, PollerConfig, PollerState};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_requested_metrics_is_intersection_with_known() {
    let mut state = PollerState::new(60_000);
    let required = names(&["disk.dev.read", "cgroup.memory.usage"]);
    assert!(state.requested_metrics(&required).is_empty());

    state.known_metrics = names(&["disk.dev.read", "mem.physmem"]);
    assert_eq!(state.requested_metrics(&required), names(&["disk.dev.read"]));
}

#[test]
fn test_reset_context_keeps_window_and_names() {
    let mut state = PollerState::new(60_000);
    state.context = Some(7);
    state.known_metrics = names(&["disk.dev.read"]);
    state.container_scoped = true;
    state.instance_domains.insert("disk.dev.read", 0, "sda");
    assert!(state.record(Snapshot::new(1000)));

    state.reset_context();
    assert_eq!(state.context, None);
    assert!(state.known_metrics.is_empty());
    assert!(!state.container_scoped);
    assert_eq!(state.window.len(), 1);
    assert_eq!(state.instance_domains.resolve("disk.dev.read", 0), Some("sda"));
}

#[test]
fn test_record_rejects_stale_sample() {
    let mut state = PollerState::new(60_000);
    assert!(state.record(Snapshot::new(2000)));
    assert!(!state.record(Snapshot::new(2000)));
    assert_eq!(state.window.len(), 1);
}

#[test]
fn test_unresolved_metrics_skip_singletons_and_known_ids() {
    let mut state = PollerState::new(60_000);
    assert!(state.unresolved_metrics().is_empty());

    state.record(
        Snapshot::new(1000)
            .with_value("mem.physmem", SINGLETON, 1.0)
            .with_value("disk.dev.read", 0, 1.0)
            .with_value("disk.dev.read", 1, 1.0)
            .with_value("kernel.all.load", 1, 0.5),
    );
    state.instance_domains.insert("kernel.all.load", 1, "1 minute");
    assert_eq!(state.unresolved_metrics(), vec!["disk.dev.read".to_string()]);

    state.instance_domains.insert("disk.dev.read", 0, "sda");
    assert_eq!(state.unresolved_metrics(), vec!["disk.dev.read".to_string()]);
    state.instance_domains.insert("disk.dev.read", 1, "sdb");
    assert!(state.unresolved_metrics().is_empty());
}

#[test]
fn test_instance_domains_due_backs_off_until_ids_change() {
    let read = vec!["disk.dev.read".to_string()];
    let mut state = PollerState::new(60_000);
    state.record(
        Snapshot::new(1000)
            .with_value("disk.dev.read", 0, 1.0)
            .with_value("mem.physmem", SINGLETON, 1.0),
    );
    let start = Instant::now();
    let at = |secs: u64| start + Duration::from_secs(secs);

    assert_eq!(state.instance_domains_due(at(0)), read);
    // the domain did not name id 0; same ids are not asked again right away
    assert!(state.instance_domains_due(at(1)).is_empty());

    state.record(
        Snapshot::new(2000)
            .with_value("disk.dev.read", 0, 1.0)
            .with_value("disk.dev.read", 1, 1.0),
    );
    assert_eq!(state.instance_domains_due(at(2)), read);
    assert!(state.instance_domains_due(at(3)).is_empty());
    assert_eq!(
        state.instance_domains_due(at(2) + INSTANCE_DOMAIN_RETRY),
        read
    );

    state.instance_domains.insert("disk.dev.read", 0, "sda");
    state.instance_domains.insert("disk.dev.read", 1, "sdb");
    assert!(state.instance_domains_due(at(2) + INSTANCE_DOMAIN_RETRY * 2).is_empty());
}

#[test]
fn test_window_ms_saturates() {
    let mut config = poller_config(None);
    assert_eq!(config.window_ms(), 60_000);
    config.window_secs = u64::MAX;
    assert_eq!(config.window_ms(), u64::MAX);
    let mut state = PollerState::new(config.window_ms());
    assert!(state.record(Snapshot::new(1000)));
    assert!(state.record(Snapshot::new(2000)));
    assert_eq!(state.window.len(), 2);
}

#[test]
fn test_frame_runs_every_chart() {
    let registry = ChartRegistry::builtin();
    let charts = registry
        .select(&["disk-iops".to_string(), "container-memory-usage".to_string()])
        .unwrap();
    let mut state = PollerState::new(60_000);
    state.hostname = Some("box".into());
    state.containers = vec![container(3, "/docker/abc", "web")];
    state.instance_domains.insert("cgroup.memory.usage", 0, "/docker/abc");
    state.record(Snapshot::new(1000).with_value("disk.dev.read", 0, 1.0));
    state.record(
        Snapshot::new(2000)
            .with_value("disk.dev.read", 0, 3.0)
            .with_value("cgroup.memory.usage", 0, 1024.0 * 1024.0),
    );

    let frame = state.frame(&charts, Some("web"));
    assert_eq!(frame.timestamp, 2000);
    assert_eq!(frame.hostname.as_deref(), Some("box"));
    assert_eq!(frame.container_id.as_deref(), Some("web"));
    assert_eq!(frame.charts.len(), 2);
    assert_eq!(frame.charts[0].id, "disk-iops");
    assert_eq!(frame.charts[0].series[0].values(), vec![Some(2.0)]);
    let memory = &frame.charts[1].series;
    assert_eq!(memory.len(), 1);
    assert_eq!(memory[0].title, "cgroup.memory.usage (web)");
    assert_eq!(memory[0].values(), vec![None, Some(1.0)]);
}

#[test]
fn test_frame_container_all_is_unfiltered() {
    let state = PollerState::new(60_000);
    let frame = state.frame(&[], Some("_all"));
    assert_eq!(frame.container_id, None);
    assert_eq!(frame.timestamp, 0);
}

#[test]
fn test_poller_config_from_app_config() {
    let config = AppConfig::load_from_str(
        r#"
[server]
port = 8081
host = "127.0.0.1"

[target]
hostname = "pcp.local"
hostspec = "pcp://db1"
container_id = "_all"

[polling]
poll_interval_ms = 2000
context_poll_interval_ms = 5000
window_secs = 120
request_timeout_ms = 5000
context_poll_timeout_secs = 30

[publishing]
broadcast_capacity = 16

[monitoring]
stats_log_interval_secs = 60
"#,
    )
    .unwrap();
    let poller = PollerConfig::from_app_config(&config);
    assert_eq!(poller.hostspec, "pcp://db1");
    assert_eq!(poller.container_id, None);
    assert_eq!(poller.window_secs, 120);
    assert_eq!(poller.context_poll_timeout_secs, 30);
    assert!(!required_metric_names(ChartRegistry::builtin().all()).is_empty());
}
