// Host memory charts

use crate::models::{ChartDefinition, LineType, TickFormat};
use crate::pipeline::{Calculation, Expr, TransformStep};

const GROUP: &str = "Memory";

pub(super) fn charts() -> Vec<ChartDefinition> {
    vec![
        // mem.util.* is reported in Kbytes
        ChartDefinition::new(
            "memory-utilization",
            GROUP,
            "Memory Utilization (Mb)",
            &["mem.util.used", "mem.util.cached", "mem.util.free"],
        )
        .transforms(vec![
            TransformStep::divide_by(1024.0),
            TransformStep::rename(&[
                ("mem.util.used", "used"),
                ("mem.util.cached", "cached"),
                ("mem.util.free", "free"),
            ]),
            TransformStep::DefaultTitleAndKeylabel,
        ])
        .y_tick_format(TickFormat::Integer)
        .line_type(LineType::StackedArea),
        ChartDefinition::new(
            "memory-used-percent",
            GROUP,
            "Memory Used (%)",
            &["mem.util.used", "mem.physmem"],
        )
        .transforms(vec![
            TransformStep::timeslice(vec![Calculation::singleton(
                "used",
                Expr::div(
                    Expr::singleton("mem.util.used"),
                    Expr::singleton("mem.physmem"),
                ),
            )]),
            TransformStep::ToPercentage,
            TransformStep::DefaultTitleAndKeylabel,
        ]),
    ]
}
