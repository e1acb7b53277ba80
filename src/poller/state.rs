// Mutable state owned by the poller task

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use crate::models::{
    ChartDefinition, ContainerList, DashboardFrame, InstanceDomainMapping, InstanceId, SINGLETON,
    Snapshot, Window,
};
use crate::pipeline::{PipelineContext, chart_frame};
use crate::pmapi::ContextId;

/// How long a metric waits before its instance domain is asked for the same
/// missing ids again.
pub const INSTANCE_DOMAIN_RETRY: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct DomainAttempt {
    at: Instant,
    ids: BTreeSet<InstanceId>,
}

/// Context, window and join data for one monitored target. Only the poller
/// mutates it; chart computation borrows it read-only.
#[derive(Debug)]
pub struct PollerState {
    pub context: Option<ContextId>,
    /// Metric names the host exports; empty until fetched for the current context.
    pub known_metrics: BTreeSet<String>,
    pub hostname: Option<String>,
    /// Whether `pmcd.client.container` has been stored for the current context.
    pub container_scoped: bool,
    pub window: Window,
    pub instance_domains: InstanceDomainMapping,
    pub containers: ContainerList,
    domain_attempts: BTreeMap<String, DomainAttempt>,
}

impl PollerState {
    pub fn new(window_ms: u64) -> Self {
        Self {
            context: None,
            known_metrics: BTreeSet::new(),
            hostname: None,
            container_scoped: false,
            window: Window::new(window_ms),
            instance_domains: InstanceDomainMapping::new(),
            containers: ContainerList::new(),
            domain_attempts: BTreeMap::new(),
        }
    }

    /// Forgets everything tied to the pmapi context. Samples and resolved
    /// instance names stay: they describe the host, not the context.
    pub fn reset_context(&mut self) {
        self.context = None;
        self.known_metrics.clear();
        self.container_scoped = false;
    }

    /// Required names the host actually exports. Empty until the metric list
    /// is known, so nothing is fetched blind.
    pub fn requested_metrics(&self, required: &BTreeSet<String>) -> BTreeSet<String> {
        required
            .intersection(&self.known_metrics)
            .cloned()
            .collect()
    }

    /// Pushes a sample into the window; false if it was not newer than the last one.
    pub fn record(&mut self, snapshot: Snapshot) -> bool {
        self.window.push(snapshot)
    }

    /// Per metric in the newest sample, the instance ids that have no name yet.
    fn unresolved_ids(&self) -> BTreeMap<String, BTreeSet<InstanceId>> {
        let Some(latest) = self.window.snapshots().last() else {
            return BTreeMap::new();
        };
        latest
            .values
            .iter()
            .filter_map(|(metric, instances)| {
                let ids = self.instance_domains.unresolved(
                    metric,
                    instances.keys().copied().filter(|id| *id != SINGLETON),
                );
                (!ids.is_empty()).then(|| (metric.clone(), ids))
            })
            .collect()
    }

    /// Metrics in the newest sample with instance ids that have no name yet.
    pub fn unresolved_metrics(&self) -> Vec<String> {
        self.unresolved_ids().into_keys().collect()
    }

    /// Unresolved metrics whose instance domain should be fetched at `now`,
    /// marked as attempted. A metric is asked again only when its missing ids
    /// change or `INSTANCE_DOMAIN_RETRY` has passed.
    pub fn instance_domains_due(&mut self, now: Instant) -> Vec<String> {
        let unresolved = self.unresolved_ids();
        self.domain_attempts
            .retain(|metric, _| unresolved.contains_key(metric));

        let mut due = Vec::new();
        for (metric, ids) in unresolved {
            let retry = match self.domain_attempts.get(&metric) {
                Some(last) => {
                    last.ids != ids
                        || now.saturating_duration_since(last.at) >= INSTANCE_DOMAIN_RETRY
                }
                None => true,
            };
            if retry {
                self.domain_attempts
                    .insert(metric.clone(), DomainAttempt { at: now, ids });
                due.push(metric);
            }
        }
        due
    }

    /// Runs every chart over the current window.
    pub fn frame(&self, charts: &[ChartDefinition], container_id: Option<&str>) -> DashboardFrame {
        let ctx = PipelineContext::new(&self.instance_domains, &self.containers, container_id);
        let snapshots = self.window.snapshots();
        DashboardFrame {
            timestamp: snapshots.last().map(|s| s.timestamp).unwrap_or_default(),
            hostname: self.hostname.clone(),
            container_id: ctx.container_filter().map(str::to_string),
            charts: charts
                .iter()
                .map(|chart| chart_frame(snapshots, chart, &ctx))
                .collect(),
        }
    }
}
