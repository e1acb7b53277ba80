// Built-in chart catalogue plus user-defined charts from config.

mod container;
mod cpu;
mod disk;
mod memory;
mod network;

use std::collections::{BTreeSet, HashSet};

use crate::models::ChartDefinition;

/// All known chart definitions, in display order: built-ins by group, then
/// custom charts in config order. Ids are unique.
#[derive(Debug, Clone)]
pub struct ChartRegistry {
    charts: Vec<ChartDefinition>,
}

impl ChartRegistry {
    pub fn builtin() -> Self {
        let charts = [
            cpu::charts(),
            memory::charts(),
            disk::charts(),
            network::charts(),
            container::charts(),
        ]
        .concat();
        Self { charts }
    }

    /// Appends custom charts. Fails on an empty id, a chart with no metrics, or
    /// an id that is already registered.
    pub fn with_custom(mut self, custom: Vec<ChartDefinition>) -> anyhow::Result<Self> {
        let mut ids: HashSet<String> = self.charts.iter().map(|c| c.id.clone()).collect();
        for chart in custom {
            anyhow::ensure!(!chart.id.trim().is_empty(), "charts.id must not be empty");
            anyhow::ensure!(
                !chart.metric_names.is_empty(),
                "charts.metricNames must not be empty for chart {}",
                chart.id
            );
            anyhow::ensure!(
                ids.insert(chart.id.clone()),
                "duplicate chart id: {}",
                chart.id
            );
            self.charts.push(chart);
        }
        Ok(self)
    }

    pub fn all(&self) -> &[ChartDefinition] {
        &self.charts
    }

    pub fn find(&self, id: &str) -> Option<&ChartDefinition> {
        self.charts.iter().find(|c| c.id == id)
    }

    /// Charts for the listed ids, in the listed order. An empty list selects
    /// every chart; an unknown id is an error.
    pub fn select(&self, ids: &[String]) -> anyhow::Result<Vec<ChartDefinition>> {
        if ids.is_empty() {
            return Ok(self.charts.clone());
        }
        ids.iter()
            .map(|id| {
                self.find(id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("unknown chart id: {}", id))
            })
            .collect()
    }

    /// Distinct group names in display order.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.charts
            .iter()
            .map(|c| c.group.as_str())
            .filter(|g| seen.insert(*g))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

impl Default for ChartRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Union of the metric names every chart in `charts` needs fetched.
pub fn required_metric_names<'a>(
    charts: impl IntoIterator<Item = &'a ChartDefinition>,
) -> BTreeSet<String> {
    charts
        .into_iter()
        .flat_map(crate::pipeline::required_metric_names)
        .collect()
}
