// Per-container charts (cgroup metrics joined to container ids)

use crate::models::{ChartDefinition, LineType, TickFormat};
use crate::pipeline::{Calculation, Expr, Reducer, TitleFormat, TransformStep};

const GROUP: &str = "Container";

const CPU_USAGE: &str = "cgroup.cpuacct.usage";
const MEM_USAGE: &str = "cgroup.memory.usage";
const MEM_LIMIT: &str = "cgroup.memory.limit";
const SHARES: &str = "cgroup.cpusched.shares";
const PERIODS: &str = "cgroup.cpusched.periods";
const THROTTLED_TIME: &str = "cgroup.cpusched.throttled_time";

const NS_PER_SEC: f64 = 1_000_000_000.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// mapInstanceDomains + mapContainerNames + filterForContainerId over `metrics`.
fn container_scoped(metrics: &[&str]) -> Vec<TransformStep> {
    vec![
        TransformStep::MapInstanceDomains,
        TransformStep::map_container_names(metrics),
        TransformStep::filter_for_container_id(metrics),
    ]
}

/// Counter chart over a blkio read/write pair, relabelled "read"/"write".
fn blkio(id: &str, title: &str, read: &str, write: &str, format: TickFormat) -> ChartDefinition {
    let mut transforms = container_scoped(&[read, write]);
    transforms.extend([
        TransformStep::CumulativeTransform,
        TransformStep::rename(&[(read, "read"), (write, "write")]),
        TransformStep::DefaultTitleAndKeylabel,
    ]);
    ChartDefinition::new(id, GROUP, title, &[read, write])
        .transforms(transforms)
        .y_tick_format(format)
}

pub(super) fn charts() -> Vec<ChartDefinition> {
    vec![
        ChartDefinition::new(
            "container-cpu-utilization",
            GROUP,
            "Per-Container CPU Utilization",
            &[CPU_USAGE],
        )
        .transforms(
            [
                container_scoped(&[CPU_USAGE]),
                vec![
                    TransformStep::DefaultTitleAndKeylabel,
                    TransformStep::CumulativeTransform,
                    TransformStep::divide_by(NS_PER_SEC),
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Percentage),
        ChartDefinition::new(
            "container-memory-usage",
            GROUP,
            "Per-Container Memory Usage (Mb)",
            &[MEM_USAGE],
        )
        .transforms(
            [
                container_scoped(&[MEM_USAGE]),
                vec![TransformStep::DefaultTitleAndKeylabel, TransformStep::KbToGb],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Integer),
        // Container usage is summed into one series, then split against host memory.
        ChartDefinition::new(
            "container-memory-total",
            GROUP,
            "Total Container Memory Usage (Mb)",
            &[MEM_USAGE, "mem.util.used", "mem.util.free"],
        )
        .transforms(vec![
            TransformStep::MapInstanceDomains,
            TransformStep::map_container_names(&[MEM_USAGE]),
            TransformStep::custom_title(TitleFormat::Metric),
            TransformStep::combine_by_title(Reducer::Sum),
            TransformStep::divide_by_only(1024.0, &["mem.util.used", "mem.util.free"]),
            TransformStep::divide_by_only(BYTES_PER_MB, &[MEM_USAGE]),
            TransformStep::timeslice(vec![
                Calculation::singleton(
                    "host used",
                    Expr::sub(Expr::singleton("mem.util.used"), Expr::first(MEM_USAGE)),
                ),
                Calculation::singleton("free (unused)", Expr::singleton("mem.util.free")),
                Calculation::singleton("container used", Expr::first(MEM_USAGE)),
            ]),
            TransformStep::DefaultTitleAndKeylabel,
        ])
        .y_tick_format(TickFormat::Integer)
        .line_type(LineType::StackedArea),
        ChartDefinition::new(
            "container-memory-headroom",
            GROUP,
            "Per-Container Memory Headroom (Mb)",
            &[MEM_USAGE, MEM_LIMIT, "mem.physmem"],
        )
        .transforms(
            [
                container_scoped(&[MEM_USAGE, MEM_LIMIT]),
                vec![
                    TransformStep::divide_by_only(1024.0, &["mem.physmem"]),
                    TransformStep::divide_by_only(BYTES_PER_MB, &[MEM_USAGE, MEM_LIMIT]),
                    TransformStep::timeslice(vec![Calculation::per_instance(
                        "headroom",
                        MEM_USAGE,
                        Expr::sub(
                            Expr::min(Expr::value(MEM_LIMIT), Expr::singleton("mem.physmem")),
                            Expr::value(MEM_USAGE),
                        ),
                    )]),
                    TransformStep::DefaultTitleAndKeylabel,
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Integer),
        blkio(
            "container-disk-iops",
            "Container Disk IOPS",
            "cgroup.blkio.all.io_serviced.read",
            "cgroup.blkio.all.io_serviced.write",
            TickFormat::Number,
        ),
        blkio(
            "container-disk-throughput",
            "Container Disk Throughput (Bytes)",
            "cgroup.blkio.all.io_service_bytes.read",
            "cgroup.blkio.all.io_service_bytes.write",
            TickFormat::Integer,
        ),
        blkio(
            "container-disk-iops-throttled",
            "Container Disk IOPS (Throttled)",
            "cgroup.blkio.all.throttle.io_serviced.read",
            "cgroup.blkio.all.throttle.io_serviced.write",
            TickFormat::Number,
        ),
        blkio(
            "container-disk-throughput-throttled",
            "Container Disk Throughput (Throttled) (Bytes)",
            "cgroup.blkio.all.throttle.io_service_bytes.read",
            "cgroup.blkio.all.throttle.io_service_bytes.write",
            TickFormat::Integer,
        ),
        ChartDefinition::new(
            "container-cpu-scheduler",
            GROUP,
            "Per-Container CPU Scheduler",
            &[SHARES, PERIODS],
        )
        .transforms(
            [
                container_scoped(&[SHARES, PERIODS]),
                vec![
                    TransformStep::rename(&[(SHARES, "shares"), (PERIODS, "periods")]),
                    TransformStep::DefaultTitleAndKeylabel,
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Integer),
        // limit = shares / periods when shares are set, else every cpu on the host
        ChartDefinition::new(
            "container-cpu-headroom",
            GROUP,
            "Per-Container CPU Headroom",
            &[CPU_USAGE, SHARES, PERIODS, "hinv.ncpu"],
        )
        .transforms(
            [
                container_scoped(&[CPU_USAGE, SHARES, PERIODS]),
                vec![
                    TransformStep::cumulative_only(&[CPU_USAGE]),
                    TransformStep::divide_by_only(NS_PER_SEC, &[CPU_USAGE]),
                    TransformStep::timeslice(vec![
                        Calculation::per_instance("usage", CPU_USAGE, Expr::value(CPU_USAGE)),
                        Calculation::per_instance(
                            "limit",
                            PERIODS,
                            Expr::or(
                                Expr::div(Expr::value(SHARES), Expr::value(PERIODS)),
                                Expr::singleton("hinv.ncpu"),
                            ),
                        ),
                    ]),
                    TransformStep::DefaultTitleAndKeylabel,
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Percentage)
        .line_type(LineType::StackedArea),
        ChartDefinition::new(
            "container-cpu-throttled",
            GROUP,
            "Per-Container Throttled CPU",
            &[THROTTLED_TIME],
        )
        .transforms(
            [
                container_scoped(&[THROTTLED_TIME]),
                vec![
                    TransformStep::CumulativeTransform,
                    TransformStep::custom_title(TitleFormat::Instance),
                ],
            ]
            .concat(),
        ),
        ChartDefinition::new(
            "container-memory-utilization",
            GROUP,
            "Per-Container Memory Utilization (%)",
            &[MEM_USAGE, MEM_LIMIT, "mem.physmem"],
        )
        .transforms(
            [
                container_scoped(&[MEM_USAGE, MEM_LIMIT]),
                vec![
                    TransformStep::divide_by_only(1024.0, &["mem.physmem"]),
                    TransformStep::divide_by_only(BYTES_PER_MB, &[MEM_USAGE, MEM_LIMIT]),
                    TransformStep::timeslice(vec![Calculation::per_instance(
                        "utilization",
                        MEM_USAGE,
                        Expr::div(
                            Expr::value(MEM_USAGE),
                            Expr::min(Expr::value(MEM_LIMIT), Expr::singleton("mem.physmem")),
                        ),
                    )]),
                    TransformStep::DefaultTitleAndKeylabel,
                ],
            ]
            .concat(),
        )
        .y_tick_format(TickFormat::Percentage),
    ]
}
