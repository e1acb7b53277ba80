// Chart definitions (registry records) and published dashboard frames

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::series::Series;
use crate::pipeline::TransformStep;

/// Y axis tick format hint for the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickFormat {
    Percentage,
    Integer,
    #[default]
    Number,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Line,
    StackedArea,
}

/// Immutable description of one chart: which metrics to read and how to
/// transform them. Plain data, so it can come from TOML or JSON as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDefinition {
    pub id: String,
    pub group: String,
    pub title: String,
    pub metric_names: BTreeSet<String>,
    #[serde(default)]
    pub transforms: Vec<TransformStep>,
    #[serde(default)]
    pub y_tick_format: TickFormat,
    #[serde(default)]
    pub line_type: LineType,
}

impl ChartDefinition {
    pub fn new(id: &str, group: &str, title: &str, metric_names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            group: group.to_string(),
            title: title.to_string(),
            metric_names: metric_names.iter().map(|m| m.to_string()).collect(),
            transforms: Vec::new(),
            y_tick_format: TickFormat::default(),
            line_type: LineType::default(),
        }
    }

    pub fn transforms(mut self, transforms: Vec<TransformStep>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn y_tick_format(mut self, format: TickFormat) -> Self {
        self.y_tick_format = format;
        self
    }

    pub fn line_type(mut self, line_type: LineType) -> Self {
        self.line_type = line_type;
        self
    }
}

/// Computed series for one chart at one poll tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    pub id: String,
    pub group: String,
    pub title: String,
    pub y_tick_format: TickFormat,
    pub line_type: LineType,
    /// Empty until the chart's metrics show up ("no data yet").
    pub series: Vec<Series>,
}

/// Everything the dashboard shows after one poll tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFrame {
    pub timestamp: u64,
    pub hostname: Option<String>,
    pub container_id: Option<String>,
    pub charts: Vec<ChartFrame>,
}
