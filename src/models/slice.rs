// TimeSlice: every tracked metric's values at one aligned timestamp

use std::collections::BTreeMap;

use super::series::Instance;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSlice {
    pub ts: u64,
    values: BTreeMap<String, BTreeMap<Instance, f64>>,
}

impl TimeSlice {
    pub fn new(ts: u64) -> Self {
        Self {
            ts,
            values: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, metric: &str, instance: Instance, value: f64) {
        self.values
            .entry(metric.to_string())
            .or_default()
            .insert(instance, value);
    }

    pub fn value(&self, metric: &str, instance: &Instance) -> Option<f64> {
        self.values.get(metric).and_then(|m| m.get(instance)).copied()
    }

    /// First value of `metric` in instance order.
    pub fn first(&self, metric: &str) -> Option<f64> {
        self.values
            .get(metric)
            .and_then(|m| m.values().next())
            .copied()
    }

    /// Instances that have a value for `metric` in this slice.
    pub fn instances(&self, metric: &str) -> Vec<Instance> {
        self.values
            .get(metric)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}
