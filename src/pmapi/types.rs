// pmwebapi response bodies and the pure conversions out of them

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ContainerEntry, ContainerList, InstanceId, SINGLETON, Snapshot};

pub type ContextId = u64;

#[derive(Debug, Deserialize)]
pub struct ContextResponse {
    pub context: ContextId,
}

#[derive(Debug, Deserialize)]
pub struct MetricListResponse {
    #[serde(default)]
    pub metrics: Vec<MetricDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    #[serde(default)]
    pub pmid: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FetchTimestamp {
    pub s: u64,
    #[serde(default)]
    pub us: u64,
}

#[derive(Debug, Deserialize)]
pub struct FetchResponse {
    pub timestamp: FetchTimestamp,
    #[serde(default)]
    pub values: Vec<FetchValue>,
}

#[derive(Debug, Deserialize)]
pub struct FetchValue {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<FetchInstance>,
}

/// `instance` is -1 or absent for singleton metrics. `value` is a number for
/// numeric metrics and a string for string-valued ones.
#[derive(Debug, Deserialize)]
pub struct FetchInstance {
    #[serde(default)]
    pub instance: Option<InstanceId>,
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct IndomResponse {
    #[serde(default)]
    pub instances: Vec<IndomInstance>,
}

#[derive(Debug, Deserialize)]
pub struct IndomInstance {
    pub instance: InstanceId,
    pub name: String,
}

impl FetchTimestamp {
    pub fn as_millis(&self) -> u64 {
        self.s.saturating_mul(1000).saturating_add(self.us / 1000)
    }
}

impl FetchInstance {
    fn id(&self) -> InstanceId {
        self.instance.unwrap_or(SINGLETON)
    }
}

pub fn metric_names(resp: MetricListResponse) -> BTreeSet<String> {
    resp.metrics.into_iter().map(|m| m.name).collect()
}

/// Numeric values only; string values and non-finite numbers are skipped.
pub fn snapshot_from_fetch(resp: &FetchResponse) -> Snapshot {
    let mut snapshot = Snapshot::new(resp.timestamp.as_millis());
    for metric in &resp.values {
        for inst in &metric.instances {
            if let Some(v) = inst.value.as_f64().filter(|v| v.is_finite()) {
                snapshot.insert(&metric.name, inst.id(), v);
            }
        }
    }
    snapshot
}

/// Instance -> value for `name`, numbers rendered as text. Empty if the metric
/// is missing from the response.
pub fn strings_from_fetch(resp: &FetchResponse, name: &str) -> BTreeMap<InstanceId, String> {
    resp.values
        .iter()
        .find(|v| v.name == name)
        .map(|metric| {
            metric
                .instances
                .iter()
                .filter_map(|inst| {
                    let text = match &inst.value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    Some((inst.id(), text))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn instance_domain(resp: IndomResponse) -> BTreeMap<InstanceId, String> {
    resp.instances
        .into_iter()
        .map(|i| (i.instance, i.name))
        .collect()
}

/// One row per cgroup instance; the container id comes from the
/// `containers.name` value of the same instance, else the cgroup itself.
pub fn join_containers(
    cgroups: &BTreeMap<InstanceId, String>,
    names: &BTreeMap<InstanceId, String>,
) -> ContainerList {
    cgroups
        .iter()
        .map(|(&instance, cgroup)| ContainerEntry {
            instance,
            cgroup: cgroup.clone(),
            container_id: names.get(&instance).unwrap_or(cgroup).clone(),
        })
        .collect()
}
