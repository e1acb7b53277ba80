// Host network charts: TCP connection gauges and interface throughput

use crate::models::{ChartDefinition, TickFormat};
use crate::pipeline::TransformStep;

const GROUP: &str = "Network";

fn tcp_gauge(id: &str, title: &str, metric: &str) -> ChartDefinition {
    ChartDefinition::new(id, GROUP, title, &[metric])
        .transforms(vec![TransformStep::DefaultTitleAndKeylabel])
        .y_tick_format(TickFormat::Integer)
}

pub(super) fn charts() -> Vec<ChartDefinition> {
    vec![
        tcp_gauge(
            "network-tcp-timewait",
            "TCP Connections (TIME_WAIT)",
            "network.tcpconn.time_wait",
        ),
        tcp_gauge(
            "network-tcp-established",
            "TCP Connections (ESTABLISHED)",
            "network.tcpconn.established",
        ),
        tcp_gauge(
            "network-tcp-close-wait",
            "TCP Connections (CLOSE_WAIT)",
            "network.tcpconn.close_wait",
        ),
        ChartDefinition::new(
            "network-tcp-all",
            GROUP,
            "TCP Connections",
            &[
                "network.tcpconn.established",
                "network.tcpconn.time_wait",
                "network.tcpconn.close_wait",
            ],
        )
        .transforms(vec![
            TransformStep::rename(&[
                ("network.tcpconn.established", "established"),
                ("network.tcpconn.time_wait", "time_wait"),
                ("network.tcpconn.close_wait", "close_wait"),
            ]),
            TransformStep::DefaultTitleAndKeylabel,
        ])
        .y_tick_format(TickFormat::Integer),
        ChartDefinition::new(
            "network-throughput",
            GROUP,
            "Network Throughput (Bytes/s)",
            &["network.interface.in.bytes", "network.interface.out.bytes"],
        )
        .transforms(vec![
            TransformStep::MapInstanceDomains,
            TransformStep::PerSecondRate,
            TransformStep::rename(&[
                ("network.interface.in.bytes", "in"),
                ("network.interface.out.bytes", "out"),
            ]),
            TransformStep::DefaultTitleAndKeylabel,
        ])
        .y_tick_format(TickFormat::Integer),
    ]
}
