// Metric transformation pipeline: extraction, transform steps, chart processing.
// Pure and synchronous; never touches the network.

pub mod calc;
pub mod extract;
mod processor;
mod step;
pub mod transform;

pub use calc::{Calculation, Expr, InstanceScope};
pub use extract::{instances_for, raw_series, value_for};
pub use processor::{calculate_chart, chart_frame, required_metric_names};
pub use step::{Reducer, TitleFormat, TransformStep};

use crate::models::{ContainerEntry, InstanceDomainMapping, Series};

/// Container filter value meaning "every container".
pub const ALL_CONTAINERS: &str = "_all";

static EMPTY_DOMAINS: InstanceDomainMapping = InstanceDomainMapping::new();

/// Read-only join context handed to every step of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    pub instance_domains: &'a InstanceDomainMapping,
    pub containers: &'a [ContainerEntry],
    pub container_id: Option<&'a str>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        instance_domains: &'a InstanceDomainMapping,
        containers: &'a [ContainerEntry],
        container_id: Option<&'a str>,
    ) -> Self {
        Self {
            instance_domains,
            containers,
            container_id,
        }
    }

    /// No instance names, no containers, no filter.
    pub fn empty() -> PipelineContext<'static> {
        PipelineContext {
            instance_domains: &EMPTY_DOMAINS,
            containers: &[],
            container_id: None,
        }
    }

    /// The active container filter; `None` for unset, empty or `_all`.
    pub fn container_filter(&self) -> Option<&'a str> {
        self.container_id
            .filter(|id| !id.is_empty() && *id != ALL_CONTAINERS)
    }
}

/// Ordered steps run left to right, each over the previous step's output.
#[derive(Debug, Clone, Copy)]
pub struct TransformPipeline<'a> {
    steps: &'a [TransformStep],
}

impl<'a> TransformPipeline<'a> {
    pub fn new(steps: &'a [TransformStep]) -> Self {
        Self { steps }
    }

    pub fn run(&self, initial: Vec<Series>, ctx: &PipelineContext<'_>) -> Vec<Series> {
        self.steps.iter().fold(initial, |series, step| {
            let out = step.apply(&series, ctx);
            tracing::trace!(
                step = step.name(),
                series_in = series.len(),
                series_out = out.len(),
                "transform step"
            );
            out
        })
    }
}
