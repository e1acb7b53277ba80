// Join context: instance-domain names and the container list

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::snapshot::InstanceId;

/// metric name -> instance id -> instance name. Filled in incrementally by the
/// poller as instance domains are fetched; ids without an entry stay numeric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceDomainMapping {
    domains: BTreeMap<String, BTreeMap<InstanceId, String>>,
}

impl InstanceDomainMapping {
    pub const fn new() -> Self {
        Self {
            domains: BTreeMap::new(),
        }
    }

    pub fn resolve(&self, metric: &str, instance: InstanceId) -> Option<&str> {
        self.domains
            .get(metric)
            .and_then(|d| d.get(&instance))
            .map(String::as_str)
    }

    pub fn insert(&mut self, metric: &str, instance: InstanceId, name: impl Into<String>) {
        self.domains
            .entry(metric.to_string())
            .or_default()
            .insert(instance, name.into());
    }

    /// Merges a freshly fetched domain; existing names for other ids are kept.
    pub fn merge_domain(&mut self, metric: &str, domain: BTreeMap<InstanceId, String>) {
        self.domains
            .entry(metric.to_string())
            .or_default()
            .extend(domain);
    }

    /// The ids among `ids` with no resolved name for `metric`.
    pub fn unresolved(
        &self,
        metric: &str,
        ids: impl IntoIterator<Item = InstanceId>,
    ) -> BTreeSet<InstanceId> {
        let domain = self.domains.get(metric);
        ids.into_iter()
            .filter(|id| !domain.is_some_and(|d| d.contains_key(id)))
            .collect()
    }

    pub fn metric_count(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// One row of the container list: a `containers.*` instance, its cgroup path
/// and its container id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerEntry {
    pub instance: InstanceId,
    pub cgroup: String,
    pub container_id: String,
}

pub type ContainerList = Vec<ContainerEntry>;
