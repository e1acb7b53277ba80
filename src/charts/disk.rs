// Host disk charts (disk.dev.* counters)

use crate::models::{ChartDefinition, TickFormat};
use crate::pipeline::TransformStep;

const GROUP: &str = "Disk";

fn counters() -> Vec<TransformStep> {
    vec![
        TransformStep::MapInstanceDomains,
        TransformStep::DefaultTitleAndKeylabel,
        TransformStep::CumulativeTransform,
    ]
}

pub(super) fn charts() -> Vec<ChartDefinition> {
    vec![
        ChartDefinition::new(
            "disk-iops",
            GROUP,
            "Disk IOPS",
            &["disk.dev.read", "disk.dev.write"],
        )
        .transforms(counters()),
        ChartDefinition::new(
            "disk-latency",
            GROUP,
            "Disk Latency",
            &[
                "disk.dev.read_rawactive",
                "disk.dev.write_rawactive",
                "disk.dev.read",
                "disk.dev.write",
            ],
        )
        .transforms(counters()),
        ChartDefinition::new(
            "disk-throughput",
            GROUP,
            "Disk Throughput (Kbytes)",
            &["disk.dev.read_bytes", "disk.dev.write_bytes"],
        )
        .transforms(counters())
        .y_tick_format(TickFormat::Integer),
        // avactive is milliseconds busy per device
        ChartDefinition::new(
            "disk-utilization",
            GROUP,
            "Disk Utilization",
            &["disk.dev.avactive"],
        )
        .transforms(vec![
            TransformStep::MapInstanceDomains,
            TransformStep::DefaultTitleAndKeylabel,
            TransformStep::divide_by(1000.0),
            TransformStep::CumulativeTransform,
        ])
        .y_tick_format(TickFormat::Percentage),
    ]
}
