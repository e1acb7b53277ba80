// Model tests: Window retention, serde shapes, instance domains

use pcpview::models::*;
use std::collections::BTreeSet;

#[test]
fn test_window_rejects_non_increasing_timestamps() {
    let mut window = Window::new(60_000);
    assert!(window.push(Snapshot::new(1000)));
    assert!(!window.push(Snapshot::new(1000)));
    assert!(!window.push(Snapshot::new(500)));
    assert!(window.push(Snapshot::new(2000)));
    assert_eq!(window.len(), 2);
}

#[test]
fn test_window_evicts_older_than_retention() {
    let mut window = Window::new(10_000);
    for ts in [0, 4_000, 8_000, 12_000, 16_000] {
        assert!(window.push(Snapshot::new(ts)));
    }
    let kept: Vec<u64> = window.snapshots().iter().map(|s| s.timestamp).collect();
    assert_eq!(kept, vec![8_000, 12_000, 16_000]);
}

#[test]
fn test_window_keeps_boundary_snapshot() {
    let mut window = Window::new(10_000);
    window.push(Snapshot::new(5_000));
    window.push(Snapshot::new(15_000));
    assert_eq!(window.len(), 2);
    window.clear();
    assert!(window.is_empty());
    assert_eq!(window.retention_ms(), 10_000);
}

#[test]
fn test_series_serializes_without_metric_and_instance() {
    let s = Series::new(
        "disk.dev.read",
        Instance::Name("sda".into()),
        vec![DataPoint::new(1000, Some(1.5)), DataPoint::new(2000, None)],
    );
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "title": "disk.dev.read (sda)",
            "keylabel": "disk.dev.read (sda)",
            "data": [{"ts": 1000, "value": 1.5}, {"ts": 2000, "value": null}]
        })
    );
}

#[test]
fn test_instance_display() {
    assert_eq!(Instance::Singleton.to_string(), "-1");
    assert_eq!(Instance::from_id(4).to_string(), "4");
    assert_eq!(Instance::from_id(SINGLETON), Instance::Singleton);
    assert_eq!(Instance::Name("web".into()).to_string(), "web");
}

#[test]
fn test_default_label() {
    assert_eq!(default_label("mem.physmem", &Instance::Singleton), "mem.physmem");
    assert_eq!(default_label("disk.dev.read", &Instance::Id(0)), "disk.dev.read (0)");
}

#[test]
fn test_instance_domain_mapping_merge_and_resolve() {
    let mut mapping = InstanceDomainMapping::new();
    assert!(mapping.is_empty());
    mapping.insert("disk.dev.read", 0, "sda");
    mapping.merge_domain(
        "disk.dev.read",
        [(1, "sdb".to_string())].into_iter().collect(),
    );
    assert_eq!(mapping.resolve("disk.dev.read", 0), Some("sda"));
    assert_eq!(mapping.resolve("disk.dev.read", 1), Some("sdb"));
    assert_eq!(mapping.resolve("disk.dev.read", 2), None);
    assert_eq!(mapping.resolve("disk.dev.write", 0), None);
    assert_eq!(mapping.metric_count(), 1);
}

#[test]
fn test_instance_domain_mapping_unresolved_ids() {
    let mut mapping = InstanceDomainMapping::new();
    assert_eq!(mapping.unresolved("m", [0]), BTreeSet::from([0]));
    assert!(mapping.unresolved("m", []).is_empty());
    mapping.insert("m", 0, "a");
    assert!(mapping.unresolved("m", [0]).is_empty());
    assert_eq!(mapping.unresolved("m", [0, 1]), BTreeSet::from([1]));
}

#[test]
fn test_dashboard_frame_serializes_camel_case() {
    let frame = DashboardFrame {
        timestamp: 42,
        hostname: Some("box".into()),
        container_id: None,
        charts: vec![ChartFrame {
            id: "cpu-utilization".into(),
            group: "CPU".into(),
            title: "CPU Utilization".into(),
            y_tick_format: TickFormat::Percentage,
            line_type: LineType::StackedArea,
            series: vec![],
        }],
    };
    let json = serde_json::to_value(&frame).unwrap();
    assert_eq!(json["containerId"], serde_json::Value::Null);
    assert_eq!(json["charts"][0]["yTickFormat"], "percentage");
    assert_eq!(json["charts"][0]["lineType"], "stackedarea");
}
