// Transform step vocabulary. Steps are data; transform.rs interprets them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::calc::Calculation;
use crate::models::{Instance, default_label};

/// One pipeline step, tagged by `kind` on the wire:
/// `{ "kind": "divideBy", "divisor": 1000.0 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransformStep {
    MapInstanceDomains,
    MapContainerNames {
        metrics: Vec<String>,
    },
    FilterForContainerId {
        metrics: Vec<String>,
    },
    CumulativeTransform,
    CumulativeTransformOnlyMetrics {
        metrics: Vec<String>,
    },
    PerSecondRate,
    DivideBy {
        divisor: f64,
    },
    DivideByOnlyMetric {
        divisor: f64,
        metrics: Vec<String>,
    },
    RenameMetric {
        names: BTreeMap<String, String>,
    },
    CombineValuesByTitle {
        reduce: Reducer,
    },
    TimesliceCalculations {
        calculations: Vec<Calculation>,
    },
    DefaultTitleAndKeylabel,
    CustomTitleAndKeylabel {
        format: TitleFormat,
    },
    KbToGb,
    ToPercentage,
}

impl TransformStep {
    pub fn map_container_names(metrics: &[&str]) -> Self {
        TransformStep::MapContainerNames {
            metrics: to_names(metrics),
        }
    }

    pub fn filter_for_container_id(metrics: &[&str]) -> Self {
        TransformStep::FilterForContainerId {
            metrics: to_names(metrics),
        }
    }

    pub fn cumulative_only(metrics: &[&str]) -> Self {
        TransformStep::CumulativeTransformOnlyMetrics {
            metrics: to_names(metrics),
        }
    }

    pub fn divide_by(divisor: f64) -> Self {
        TransformStep::DivideBy { divisor }
    }

    pub fn divide_by_only(divisor: f64, metrics: &[&str]) -> Self {
        TransformStep::DivideByOnlyMetric {
            divisor,
            metrics: to_names(metrics),
        }
    }

    pub fn rename(pairs: &[(&str, &str)]) -> Self {
        TransformStep::RenameMetric {
            names: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    pub fn combine_by_title(reduce: Reducer) -> Self {
        TransformStep::CombineValuesByTitle { reduce }
    }

    pub fn timeslice(calculations: Vec<Calculation>) -> Self {
        TransformStep::TimesliceCalculations { calculations }
    }

    pub fn custom_title(format: TitleFormat) -> Self {
        TransformStep::CustomTitleAndKeylabel { format }
    }

    /// Step kind as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            TransformStep::MapInstanceDomains => "mapInstanceDomains",
            TransformStep::MapContainerNames { .. } => "mapContainerNames",
            TransformStep::FilterForContainerId { .. } => "filterForContainerId",
            TransformStep::CumulativeTransform => "cumulativeTransform",
            TransformStep::CumulativeTransformOnlyMetrics { .. } => {
                "cumulativeTransformOnlyMetrics"
            }
            TransformStep::PerSecondRate => "perSecondRate",
            TransformStep::DivideBy { .. } => "divideBy",
            TransformStep::DivideByOnlyMetric { .. } => "divideByOnlyMetric",
            TransformStep::RenameMetric { .. } => "renameMetric",
            TransformStep::CombineValuesByTitle { .. } => "combineValuesByTitle",
            TransformStep::TimesliceCalculations { .. } => "timesliceCalculations",
            TransformStep::DefaultTitleAndKeylabel => "defaultTitleAndKeylabel",
            TransformStep::CustomTitleAndKeylabel { .. } => "customTitleAndKeylabel",
            TransformStep::KbToGb => "kbToGb",
            TransformStep::ToPercentage => "toPercentage",
        }
    }
}

fn to_names(metrics: &[&str]) -> Vec<String> {
    metrics.iter().map(|m| m.to_string()).collect()
}

/// Pairwise fold used by `combineValuesByTitle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Min,
    Max,
}

impl Reducer {
    /// Null operands are skipped; two nulls stay null.
    pub fn fold(self, acc: Option<f64>, val: Option<f64>) -> Option<f64> {
        match (acc, val) {
            (Some(a), Some(b)) => Some(match self {
                Reducer::Sum => a + b,
                Reducer::Min => a.min(b),
                Reducer::Max => a.max(b),
            }),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

/// Title/keylabel source for `customTitleAndKeylabel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TitleFormat {
    Metric,
    Instance,
    /// `{metric}` and `{instance}` are substituted.
    Template(String),
}

impl TitleFormat {
    pub fn render(&self, metric: &str, instance: &Instance) -> String {
        match self {
            TitleFormat::Metric => metric.to_string(),
            TitleFormat::Instance => match instance {
                Instance::Singleton => default_label(metric, instance),
                other => other.to_string(),
            },
            TitleFormat::Template(template) => template
                .replace("{metric}", metric)
                .replace("{instance}", &instance.to_string()),
        }
    }
}
