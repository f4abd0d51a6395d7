// Wire model parsing and view selection types

use metricsview::models::*;
use serde_json::json;

#[test]
fn test_snapshot_parses_lenient_fields() {
    let s: MetricSnapshot = serde_json::from_value(json!({
        "id": 42,
        "ts": "2024-05-01T12:00:00",
        "cpu_percent": "33.5",
        "cpu_per_core_percent": [10.0, "n/a", 30],
        "mem_percent": "garbage",
        "mem_total_bytes": 8589934592u64,
        "disk_mount": "",
        "unknown_field": true
    }))
    .unwrap();
    assert_eq!(s.id, Some(42));
    assert_eq!(s.ts.as_deref(), Some("2024-05-01T12:00:00"));
    assert_eq!(s.cpu_percent, Some(33.5));
    assert_eq!(s.cpu_per_core_percent, Some(vec![Some(10.0), None, Some(30.0)]));
    assert_eq!(s.mem_percent, None);
    assert_eq!(s.mem_total_bytes, Some(8589934592.0));
    assert_eq!(s.disk_mount, None, "empty mount is treated as missing");
    assert_eq!(s.load_1, None);
}

#[test]
fn test_snapshot_from_empty_object_is_all_missing() {
    let s: MetricSnapshot = serde_json::from_str("{}").unwrap();
    assert_eq!(s, MetricSnapshot::default());
}

#[test]
fn test_per_core_non_array_is_missing() {
    let s: MetricSnapshot =
        serde_json::from_value(json!({ "cpu_per_core_percent": "12,13" })).unwrap();
    assert_eq!(s.cpu_per_core_percent, None);
}

#[test]
fn test_latest_response_shapes() {
    let r: LatestResponse = serde_json::from_str(r#"{"latest": null}"#).unwrap();
    assert!(r.latest.is_none());
    let r: LatestResponse = serde_json::from_str("{}").unwrap();
    assert!(r.latest.is_none());
    let r: LatestResponse = serde_json::from_str(r#"{"latest": {"id": 1}}"#).unwrap();
    assert_eq!(r.latest.unwrap().id, Some(1));
}

#[test]
fn test_range_response_shapes() {
    let r: RangeResponse = serde_json::from_str(r#"{"points": []}"#).unwrap();
    assert!(r.points.is_empty());
    let r: RangeResponse = serde_json::from_str(r#"{"points": null}"#).unwrap();
    assert!(r.points.is_empty());
    let r: RangeResponse = serde_json::from_str(
        r#"{"minutes": 15, "count": 2, "points": [{"id": 2}, {"id": 1}]}"#,
    )
    .unwrap();
    let ids: Vec<_> = r.points.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![Some(2), Some(1)]);
}

#[test]
fn test_range_window_minutes_and_parsing() {
    let minutes: Vec<u32> = RangeWindow::ALL.iter().map(|w| w.minutes()).collect();
    assert_eq!(minutes, vec![5, 15, 60, 360, 1440]);
    for window in RangeWindow::ALL {
        assert_eq!(RangeWindow::try_from(window.minutes()), Ok(window));
    }
    assert!(RangeWindow::try_from(30).is_err());
    assert_eq!(RangeWindow::default(), RangeWindow::FifteenMinutes);
    assert_eq!(RangeWindow::SixHours.to_string(), "360 min");
}

#[test]
fn test_range_window_serde_as_minutes() {
    let w: RangeWindow = serde_json::from_str("60").unwrap();
    assert_eq!(w, RangeWindow::OneHour);
    assert_eq!(serde_json::to_string(&RangeWindow::OneDay).unwrap(), "1440");
    assert!(serde_json::from_str::<RangeWindow>("45").is_err());
}

#[test]
fn test_mode_kind_parsing() {
    assert_eq!("latest".parse::<ModeKind>(), Ok(ModeKind::Latest));
    assert_eq!(" Range ".parse::<ModeKind>(), Ok(ModeKind::Range));
    assert!("history".parse::<ModeKind>().is_err());
    assert_eq!(serde_json::to_string(&ModeKind::Range).unwrap(), "\"range\"");
}

#[test]
fn test_view_mode_display_and_kind() {
    let range = ViewMode::Range {
        window: RangeWindow::FiveMinutes,
    };
    assert_eq!(ViewMode::Latest.to_string(), "latest");
    assert_eq!(range.to_string(), "range(5 min)");
    assert_eq!(range.kind(), ModeKind::Range);
    assert!(ViewMode::Latest.is_latest());
    assert!(!range.is_latest());
}
