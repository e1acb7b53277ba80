// Raw polled samples and the bounded window that holds them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instance id as reported by pmwebapi. `-1` marks a singleton metric.
pub type InstanceId = i32;

/// Sentinel instance id for non-instanced metrics.
pub const SINGLETON: InstanceId = -1;

/// One polled sample of all requested metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// metric name -> instance id -> raw value
    pub values: BTreeMap<String, BTreeMap<InstanceId, f64>>,
}

impl Snapshot {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for tests and the pmapi parser.
    pub fn with_value(mut self, metric: &str, instance: InstanceId, value: f64) -> Self {
        self.insert(metric, instance, value);
        self
    }

    pub fn insert(&mut self, metric: &str, instance: InstanceId, value: f64) {
        self.values
            .entry(metric.to_string())
            .or_default()
            .insert(instance, value);
    }
}

/// Time-ordered history of snapshots. Timestamps are strictly increasing and
/// nothing older than `retention_ms` behind the newest sample is kept.
#[derive(Debug, Clone)]
pub struct Window {
    retention_ms: u64,
    snapshots: Vec<Snapshot>,
}

impl Window {
    pub fn new(retention_ms: u64) -> Self {
        Self {
            retention_ms,
            snapshots: Vec::new(),
        }
    }

    /// Appends a snapshot and evicts expired ones. Returns false (and drops the
    /// snapshot) when its timestamp does not advance the window.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        if let Some(last) = self.snapshots.last()
            && snapshot.timestamp <= last.timestamp
        {
            return false;
        }
        let cutoff = snapshot.timestamp.saturating_sub(self.retention_ms);
        self.snapshots.push(snapshot);
        let expired = self
            .snapshots
            .iter()
            .take_while(|s| s.timestamp < cutoff)
            .count();
        if expired > 0 {
            self.snapshots.drain(..expired);
        }
        true
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn retention_ms(&self) -> u64 {
        self.retention_ms
    }
}
