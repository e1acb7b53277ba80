// Pipeline series: intermediate and final chart artifact

use serde::{Serialize, Serializer};
use std::fmt;

use super::snapshot::{InstanceId, SINGLETON};

/// Which sub-identity of a metric a series belongs to. Starts as the raw id
/// and may be replaced by a resolved name (instance domain or container id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instance {
    Singleton,
    Id(InstanceId),
    Name(String),
}

impl Instance {
    pub fn from_id(id: InstanceId) -> Self {
        if id == SINGLETON {
            Instance::Singleton
        } else {
            Instance::Id(id)
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Singleton => write!(f, "{}", SINGLETON),
            Instance::Id(id) => write!(f, "{}", id),
            Instance::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Instance::Singleton => serializer.serialize_i32(SINGLETON),
            Instance::Id(id) => serializer.serialize_i32(*id),
            Instance::Name(name) => serializer.serialize_str(name),
        }
    }
}

/// One point of a series. `value: None` serializes as `null` (no datum at this tick).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub ts: u64,
    pub value: Option<f64>,
}

impl DataPoint {
    pub fn new(ts: u64, value: Option<f64>) -> Self {
        Self { ts, value }
    }
}

/// A named, time-ordered sequence. `metric` and `instance` drive the transform
/// steps; only title, keylabel and data go over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    #[serde(skip)]
    pub metric: String,
    #[serde(skip)]
    pub instance: Instance,
    pub title: String,
    pub keylabel: String,
    pub data: Vec<DataPoint>,
}

impl Series {
    /// New series titled with the default `metric (instance)` label.
    pub fn new(metric: impl Into<String>, instance: Instance, data: Vec<DataPoint>) -> Self {
        let metric = metric.into();
        let label = default_label(&metric, &instance);
        Self {
            metric,
            instance,
            title: label.clone(),
            keylabel: label,
            data,
        }
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.data.iter().map(|p| p.value).collect()
    }
}

/// `metric (instance)`, or the bare metric for singletons.
pub fn default_label(metric: &str, instance: &Instance) -> String {
    match instance {
        Instance::Singleton => metric.to_string(),
        other => format!("{} ({})", metric, other),
    }
}
