// Host CPU charts

use crate::models::{ChartDefinition, LineType, TickFormat};
use crate::pipeline::{TitleFormat, TransformStep};

const GROUP: &str = "CPU";

/// kernel.*.cpu.* counters are milliseconds of cpu time; as a per-second rate
/// of seconds they become a fraction of one cpu.
fn utilization() -> Vec<TransformStep> {
    vec![
        TransformStep::divide_by(1000.0),
        TransformStep::PerSecondRate,
    ]
}

pub(super) fn charts() -> Vec<ChartDefinition> {
    vec![
        ChartDefinition::new(
            "cpu-utilization",
            GROUP,
            "CPU Utilization",
            &["kernel.all.cpu.user", "kernel.all.cpu.sys"],
        )
        .transforms(
            [
                utilization(),
                vec![
                    TransformStep::rename(&[
                        ("kernel.all.cpu.user", "user"),
                        ("kernel.all.cpu.sys", "sys"),
                    ]),
                    TransformStep::DefaultTitleAndKeylabel,
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Percentage)
        .line_type(LineType::StackedArea),
        ChartDefinition::new(
            "cpu-percpu-utilization",
            GROUP,
            "Per-CPU Utilization",
            &["kernel.percpu.cpu.user", "kernel.percpu.cpu.sys"],
        )
        .transforms(
            [
                vec![TransformStep::MapInstanceDomains],
                utilization(),
                vec![TransformStep::DefaultTitleAndKeylabel],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Percentage),
        ChartDefinition::new(
            "cpu-load-average",
            GROUP,
            "Load Average",
            &["kernel.all.load"],
        )
        .transforms(vec![
            TransformStep::MapInstanceDomains,
            TransformStep::custom_title(TitleFormat::Template("load ({instance})".into())),
        ]),
        ChartDefinition::new(
            "cpu-context-switches",
            GROUP,
            "Context Switches",
            &["kernel.all.pswitch"],
        )
        .transforms(vec![
            TransformStep::PerSecondRate,
            TransformStep::custom_title(TitleFormat::Template("context switches/s".into())),
        ])
        .y_tick_format(TickFormat::Integer),
    ]
}
