// Cross-metric calculations evaluated per TimeSlice.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{DataPoint, Instance, Series, TimeSlice};

/// Which instances a calculation yields at each timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceScope {
    /// A single `-1` result.
    Singleton,
    /// One result per instance that `metric` has a value for in the slice.
    InstancesOf(String),
}

/// Expression over one TimeSlice, evaluated for a given instance.
///
/// Arithmetic propagates absence; `min`/`max` ignore an absent operand;
/// division by zero and non-finite results are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    /// The metric at the instance being evaluated.
    Value(String),
    /// The metric at the singleton instance.
    Singleton(String),
    /// The metric's first value in instance order.
    First(String),
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),
    /// Left operand unless absent or zero, else the right one.
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn value(metric: &str) -> Self {
        Expr::Value(metric.to_string())
    }

    pub fn singleton(metric: &str) -> Self {
        Expr::Singleton(metric.to_string())
    }

    pub fn first(metric: &str) -> Self {
        Expr::First(metric.to_string())
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Expr, b: Expr) -> Self {
        Expr::Div(Box::new(a), Box::new(b))
    }

    pub fn min(a: Expr, b: Expr) -> Self {
        Expr::Min(Box::new(a), Box::new(b))
    }

    pub fn max(a: Expr, b: Expr) -> Self {
        Expr::Max(Box::new(a), Box::new(b))
    }

    pub fn or(a: Expr, b: Expr) -> Self {
        Expr::Or(Box::new(a), Box::new(b))
    }

    pub fn eval(&self, slice: &TimeSlice, instance: &Instance) -> Option<f64> {
        let out = match self {
            Expr::Value(metric) => slice.value(metric, instance),
            Expr::Singleton(metric) => slice.value(metric, &Instance::Singleton),
            Expr::First(metric) => slice.first(metric),
            Expr::Const(k) => Some(*k),
            Expr::Add(a, b) => Some(a.eval(slice, instance)? + b.eval(slice, instance)?),
            Expr::Sub(a, b) => Some(a.eval(slice, instance)? - b.eval(slice, instance)?),
            Expr::Mul(a, b) => Some(a.eval(slice, instance)? * b.eval(slice, instance)?),
            Expr::Div(a, b) => {
                let divisor = b.eval(slice, instance)?;
                if divisor == 0.0 {
                    None
                } else {
                    Some(a.eval(slice, instance)? / divisor)
                }
            }
            Expr::Min(a, b) => either(a.eval(slice, instance), b.eval(slice, instance), f64::min),
            Expr::Max(a, b) => either(a.eval(slice, instance), b.eval(slice, instance), f64::max),
            Expr::Or(a, b) => match a.eval(slice, instance) {
                Some(v) if v != 0.0 => Some(v),
                _ => b.eval(slice, instance),
            },
        };
        out.filter(|v| v.is_finite())
    }
}

fn either(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// A named calculation; its name becomes the metric key of the series it emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub name: String,
    pub over: InstanceScope,
    pub expr: Expr,
}

impl Calculation {
    pub fn new(name: &str, over: InstanceScope, expr: Expr) -> Self {
        Self {
            name: name.to_string(),
            over,
            expr,
        }
    }

    /// Singleton-scoped calculation.
    pub fn singleton(name: &str, expr: Expr) -> Self {
        Self::new(name, InstanceScope::Singleton, expr)
    }

    /// One result per instance of `metric`.
    pub fn per_instance(name: &str, metric: &str, expr: Expr) -> Self {
        Self::new(name, InstanceScope::InstancesOf(metric.to_string()), expr)
    }

    /// instance -> value for one slice.
    pub fn evaluate(&self, slice: &TimeSlice) -> BTreeMap<Instance, Option<f64>> {
        let instances = match &self.over {
            InstanceScope::Singleton => vec![Instance::Singleton],
            InstanceScope::InstancesOf(metric) => slice.instances(metric),
        };
        instances
            .into_iter()
            .map(|instance| {
                let value = self.expr.eval(slice, &instance);
                (instance, value)
            })
            .collect()
    }
}

/// Builds one TimeSlice per distinct timestamp of the input series, ascending.
pub fn build_time_slices(series: &[Series]) -> Vec<TimeSlice> {
    let mut slices: BTreeMap<u64, TimeSlice> = BTreeMap::new();
    for s in series {
        for point in &s.data {
            let slice = slices
                .entry(point.ts)
                .or_insert_with(|| TimeSlice::new(point.ts));
            if let Some(v) = point.value {
                slice.insert(&s.metric, s.instance.clone(), v);
            }
        }
    }
    slices.into_values().collect()
}

/// Evaluates every calculation at every timestamp and emits one series per
/// (calculation, instance). Titles are left empty for a later title step.
pub(super) fn timeslice_calculations(series: &[Series], calculations: &[Calculation]) -> Vec<Series> {
    let slices = build_time_slices(series);
    let mut out = Vec::new();
    for calc in calculations {
        let results: Vec<BTreeMap<Instance, Option<f64>>> =
            slices.iter().map(|slice| calc.evaluate(slice)).collect();
        let instances: BTreeSet<&Instance> = results.iter().flat_map(|r| r.keys()).collect();
        for instance in instances {
            let data = slices
                .iter()
                .zip(&results)
                .map(|(slice, result)| {
                    DataPoint::new(slice.ts, result.get(instance).copied().flatten())
                })
                .collect();
            out.push(Series {
                metric: calc.name.clone(),
                instance: instance.clone(),
                title: String::new(),
                keylabel: String::new(),
                data,
            });
        }
    }
    out
}
