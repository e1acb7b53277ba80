// Step interpreter: every step maps a borrowed series list to a new one.

use std::collections::{BTreeMap, HashMap};

use super::PipelineContext;
use super::calc::timeslice_calculations;
use super::step::{Reducer, TitleFormat, TransformStep};
use crate::models::{
    ContainerEntry, DataPoint, Instance, InstanceDomainMapping, Series, default_label,
};

const KB_PER_GB: f64 = 1024.0 * 1024.0;

impl TransformStep {
    pub fn apply(&self, series: &[Series], ctx: &PipelineContext<'_>) -> Vec<Series> {
        match self {
            TransformStep::MapInstanceDomains => map_instance_domains(series, ctx.instance_domains),
            TransformStep::MapContainerNames { metrics } => {
                map_container_names(series, metrics, ctx.containers)
            }
            TransformStep::FilterForContainerId { metrics } => {
                filter_for_container_id(series, metrics, ctx.container_filter())
            }
            TransformStep::CumulativeTransform => series
                .iter()
                .map(|s| with_data(s, cumulative(&s.data)))
                .collect(),
            TransformStep::CumulativeTransformOnlyMetrics { metrics } => series
                .iter()
                .map(|s| {
                    if listed(metrics, &s.metric) {
                        with_data(s, cumulative(&s.data))
                    } else {
                        s.clone()
                    }
                })
                .collect(),
            TransformStep::PerSecondRate => series
                .iter()
                .map(|s| with_data(s, per_second(&s.data)))
                .collect(),
            TransformStep::DivideBy { divisor } => divide(series, *divisor, None),
            TransformStep::DivideByOnlyMetric { divisor, metrics } => {
                divide(series, *divisor, Some(metrics))
            }
            TransformStep::RenameMetric { names } => series
                .iter()
                .map(|s| match names.get(&s.metric) {
                    Some(renamed) => Series {
                        metric: renamed.clone(),
                        ..s.clone()
                    },
                    None => s.clone(),
                })
                .collect(),
            TransformStep::CombineValuesByTitle { reduce } => combine_by_title(series, *reduce),
            TransformStep::TimesliceCalculations { calculations } => {
                timeslice_calculations(series, calculations)
            }
            TransformStep::DefaultTitleAndKeylabel => series
                .iter()
                .map(|s| {
                    let label = default_label(&s.metric, &s.instance);
                    with_labels(s, label)
                })
                .collect(),
            TransformStep::CustomTitleAndKeylabel { format } => custom_titles(series, format),
            TransformStep::KbToGb => divide(series, KB_PER_GB, None),
            TransformStep::ToPercentage => series
                .iter()
                .map(|s| map_values(s, |v| Some((v * 100.0).max(0.0))))
                .collect(),
        }
    }
}

fn listed(metrics: &[String], metric: &str) -> bool {
    metrics.iter().any(|m| m == metric)
}

fn with_data(s: &Series, data: Vec<DataPoint>) -> Series {
    Series {
        metric: s.metric.clone(),
        instance: s.instance.clone(),
        title: s.title.clone(),
        keylabel: s.keylabel.clone(),
        data,
    }
}

fn with_labels(s: &Series, label: String) -> Series {
    Series {
        title: label.clone(),
        keylabel: label,
        ..s.clone()
    }
}

fn map_values(s: &Series, f: impl Fn(f64) -> Option<f64>) -> Series {
    let data = s
        .data
        .iter()
        .map(|p| DataPoint::new(p.ts, p.value.and_then(&f)))
        .collect();
    with_data(s, data)
}

/// Swaps the instance; labels still in the default format follow the new instance.
fn reinstance(s: &Series, instance: Instance) -> Series {
    let old_label = default_label(&s.metric, &s.instance);
    let new_label = default_label(&s.metric, &instance);
    Series {
        metric: s.metric.clone(),
        title: if s.title == old_label {
            new_label.clone()
        } else {
            s.title.clone()
        },
        keylabel: if s.keylabel == old_label {
            new_label
        } else {
            s.keylabel.clone()
        },
        instance,
        data: s.data.clone(),
    }
}

fn map_instance_domains(series: &[Series], domains: &InstanceDomainMapping) -> Vec<Series> {
    series
        .iter()
        .map(|s| match &s.instance {
            Instance::Id(id) => match domains.resolve(&s.metric, *id) {
                Some(name) => reinstance(s, Instance::Name(name.to_string())),
                None => s.clone(),
            },
            _ => s.clone(),
        })
        .collect()
}

/// Joins on the cgroup path only. A raw id belongs to the metric's own
/// instance domain, not to `containers.*`, so unresolved rows never match.
fn find_container<'a>(containers: &'a [ContainerEntry], instance: &Instance) -> Option<&'a ContainerEntry> {
    match instance {
        Instance::Name(name) => containers.iter().find(|c| &c.cgroup == name),
        Instance::Id(_) | Instance::Singleton => None,
    }
}

fn map_container_names(
    series: &[Series],
    metrics: &[String],
    containers: &[ContainerEntry],
) -> Vec<Series> {
    series
        .iter()
        .map(|s| {
            if !listed(metrics, &s.metric) {
                return s.clone();
            }
            match find_container(containers, &s.instance) {
                Some(c) => reinstance(s, Instance::Name(c.container_id.clone())),
                None => s.clone(),
            }
        })
        .collect()
}

fn filter_for_container_id(
    series: &[Series],
    metrics: &[String],
    container_id: Option<&str>,
) -> Vec<Series> {
    let Some(container_id) = container_id else {
        return series.to_vec();
    };
    series
        .iter()
        .filter(|s| {
            !listed(metrics, &s.metric)
                || matches!(&s.instance, Instance::Name(name) if name == container_id)
        })
        .cloned()
        .collect()
}

/// n counter samples -> n-1 deltas. The first sample has no baseline and is
/// dropped; a decrease (reset or wrap) is clamped to 0.
pub fn cumulative(data: &[DataPoint]) -> Vec<DataPoint> {
    data.windows(2)
        .map(|w| {
            let value = match (w[0].value, w[1].value) {
                (Some(prev), Some(cur)) => Some((cur - prev).max(0.0)),
                _ => None,
            };
            DataPoint::new(w[1].ts, value)
        })
        .collect()
}

/// Like `cumulative`, divided by the seconds between the two samples.
pub fn per_second(data: &[DataPoint]) -> Vec<DataPoint> {
    data.windows(2)
        .map(|w| {
            let elapsed_ms = w[1].ts.saturating_sub(w[0].ts);
            let value = match (w[0].value, w[1].value) {
                (Some(prev), Some(cur)) if elapsed_ms > 0 => {
                    Some((cur - prev).max(0.0) / (elapsed_ms as f64 / 1000.0))
                }
                _ => None,
            };
            DataPoint::new(w[1].ts, value)
        })
        .collect()
}

fn divide(series: &[Series], divisor: f64, only: Option<&Vec<String>>) -> Vec<Series> {
    series
        .iter()
        .map(|s| {
            if only.is_some_and(|metrics| !listed(metrics, &s.metric)) {
                return s.clone();
            }
            map_values(s, |v| {
                if divisor == 0.0 {
                    None
                } else {
                    Some(v / divisor).filter(|q| q.is_finite())
                }
            })
        })
        .collect()
}

/// Folds series that share a title, point by point on matching timestamps.
/// The first series of each group supplies metric, instance and labels.
fn combine_by_title(series: &[Series], reduce: Reducer) -> Vec<Series> {
    let mut groups: Vec<(&Series, BTreeMap<u64, Option<f64>>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for s in series {
        match index.get(s.title.as_str()) {
            Some(&i) => {
                let acc = &mut groups[i].1;
                for p in &s.data {
                    let slot = acc.entry(p.ts).or_insert(None);
                    *slot = reduce.fold(*slot, p.value);
                }
            }
            None => {
                index.insert(s.title.as_str(), groups.len());
                groups.push((s, s.data.iter().map(|p| (p.ts, p.value)).collect()));
            }
        }
    }

    groups
        .into_iter()
        .map(|(template, acc)| {
            let data = acc
                .into_iter()
                .map(|(ts, value)| DataPoint::new(ts, value))
                .collect();
            with_data(template, data)
        })
        .collect()
}

fn custom_titles(series: &[Series], format: &TitleFormat) -> Vec<Series> {
    series
        .iter()
        .map(|s| with_labels(s, format.render(&s.metric, &s.instance)))
        .collect()
}
