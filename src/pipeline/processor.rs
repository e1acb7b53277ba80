// Chart processor: window + definition + context -> final series

use std::collections::BTreeSet;

use super::extract::{instances_for, raw_series};
use super::{PipelineContext, TransformPipeline};
use crate::models::{ChartDefinition, ChartFrame, Series, Snapshot};

/// Extracts every observed (metric, instance) of the chart from the window and
/// runs the chart's transforms over them. Empty when none of the chart's
/// metrics has been seen yet.
pub fn calculate_chart(
    window: &[Snapshot],
    chart: &ChartDefinition,
    ctx: &PipelineContext<'_>,
) -> Vec<Series> {
    let instances = instances_for(window, &chart.metric_names);
    if instances.is_empty() {
        tracing::trace!(chart = %chart.id, "no data yet");
        return Vec::new();
    }
    let initial: Vec<Series> = instances
        .iter()
        .map(|(metric, instance)| raw_series(window, metric, *instance))
        .collect();
    TransformPipeline::new(&chart.transforms).run(initial, ctx)
}

/// Metric names the poller must fetch for this chart; the transforms play no part.
pub fn required_metric_names(chart: &ChartDefinition) -> BTreeSet<String> {
    chart.metric_names.clone()
}

/// `calculate_chart` packaged with the chart's display metadata.
pub fn chart_frame(
    window: &[Snapshot],
    chart: &ChartDefinition,
    ctx: &PipelineContext<'_>,
) -> ChartFrame {
    ChartFrame {
        id: chart.id.clone(),
        group: chart.group.clone(),
        title: chart.title.clone(),
        y_tick_format: chart.y_tick_format,
        line_type: chart.line_type,
        series: calculate_chart(window, chart, ctx),
    }
}
