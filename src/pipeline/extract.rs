// Reading raw values out of snapshots

use std::collections::BTreeSet;

use crate::models::{DataPoint, Instance, InstanceId, Series, Snapshot};

/// Value of `metric`/`instance` in one snapshot. `None` when the metric was not
/// fetched for this tick or the instance is not present.
pub fn value_for(snapshot: &Snapshot, metric: &str, instance: InstanceId) -> Option<f64> {
    snapshot.values.get(metric)?.get(&instance).copied()
}

/// Union of (metric, instance) pairs seen for `metric_names` anywhere in the
/// window, ordered by metric name then instance id (`-1` first).
pub fn instances_for<I, S>(window: &[Snapshot], metric_names: I) -> BTreeSet<(String, InstanceId)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<S> = metric_names.into_iter().collect();
    let mut out = BTreeSet::new();
    for snapshot in window {
        for name in &names {
            let name = name.as_ref();
            if let Some(instances) = snapshot.values.get(name) {
                for id in instances.keys() {
                    out.insert((name.to_string(), *id));
                }
            }
        }
    }
    out
}

/// One point per snapshot for `metric`/`instance`, null where absent.
pub fn raw_series(window: &[Snapshot], metric: &str, instance: InstanceId) -> Series {
    let data = window
        .iter()
        .map(|s| DataPoint::new(s.timestamp, value_for(s, metric, instance)))
        .collect();
    Series::new(metric, Instance::from_id(instance), data)
}
