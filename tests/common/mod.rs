// Shared test helpers

#![allow(dead_code)]

pub mod pmproxy;

use pcpview::models::*;
use pcpview::poller::PollerConfig;

/// Window of snapshots at `ts` (ms), each holding `metric` at `instance`.
pub fn counter_window(metric: &str, instance: InstanceId, samples: &[(u64, f64)]) -> Vec<Snapshot> {
    samples
        .iter()
        .map(|&(ts, v)| Snapshot::new(ts).with_value(metric, instance, v))
        .collect()
}

pub fn series(metric: &str, instance: Instance, points: &[(u64, Option<f64>)]) -> Series {
    Series::new(
        metric,
        instance,
        points.iter().map(|&(ts, v)| DataPoint::new(ts, v)).collect(),
    )
}

pub fn gauge(metric: &str, instance: Instance, points: &[(u64, f64)]) -> Series {
    series(
        metric,
        instance,
        &points.iter().map(|&(ts, v)| (ts, Some(v))).collect::<Vec<_>>(),
    )
}

pub fn container(instance: InstanceId, cgroup: &str, container_id: &str) -> ContainerEntry {
    ContainerEntry {
        instance,
        cgroup: cgroup.to_string(),
        container_id: container_id.to_string(),
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Poller settings for tests: fast sample tick, everything else slow.
pub fn poller_config(container_id: Option<&str>) -> PollerConfig {
    PollerConfig {
        hostspec: "localhost".into(),
        container_id: container_id.map(str::to_string),
        poll_interval_ms: 20,
        context_poll_interval_ms: 60_000,
        window_secs: 60,
        context_poll_timeout_secs: 10,
        stats_log_interval_secs: 3600,
    }
}
