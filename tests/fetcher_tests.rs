// HttpSource against a local axum backend

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use metricsview::error::DashboardError;
use metricsview::fetcher::{HttpSource, MAX_RANGE_LIMIT, MetricsSource};
use metricsview::models::RangeWindow;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Query string and Cache-Control header of every request the backend saw.
type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn record(seen: &Seen, query: HashMap<String, String>, headers: &HeaderMap) {
    let cache = headers
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.lock().unwrap().push((query, cache));
}

async fn latest_handler(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    record(&seen, query, &headers);
    Json(json!({
        "latest": {
            "id": 7,
            "ts": "2024-05-01T12:30:45Z",
            "cpu_percent": 12.5,
            "load_1": "0.75",
            "mem_total_bytes": 17179869184u64,
            "disk_mount": "/",
            "disk_percent": null
        }
    }))
}

async fn range_handler(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    record(&seen, query, &headers);
    Json(json!({
        "points": [
            { "id": 2, "ts": "2024-05-01T12:00:02Z", "cpu_percent": 20.0 },
            { "id": 1, "ts": "2024-05-01T12:00:01Z", "cpu_percent": 10.0 }
        ]
    }))
}

async fn backend() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/api/latest", get(latest_handler))
        .route("/api/range", get(range_handler))
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(seen.clone());
    (serve(app).await, seen)
}

#[tokio::test]
async fn latest_decodes_snapshot() {
    let (base, _) = backend().await;
    let source = HttpSource::new(base).unwrap();

    let snapshot = source.fetch_latest().await.unwrap().unwrap();
    assert_eq!(snapshot.id, Some(7));
    assert_eq!(snapshot.cpu_percent, Some(12.5));
    assert_eq!(snapshot.load_1, Some(0.75));
    assert_eq!(snapshot.mem_total_bytes, Some(17179869184.0));
    assert_eq!(snapshot.disk_mount.as_deref(), Some("/"));
    assert_eq!(snapshot.disk_percent, None);
}

#[tokio::test]
async fn every_request_bypasses_caches() {
    let (base, seen) = backend().await;
    let source = HttpSource::new(format!("{base}/")).unwrap();

    source.fetch_latest().await.unwrap();
    source.fetch_latest().await.unwrap();
    source.fetch_range(RangeWindow::FiveMinutes, 10).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    let tokens: Vec<&String> = seen.iter().map(|(q, _)| q.get("t").unwrap()).collect();
    assert_ne!(tokens[0], tokens[1]);
    assert_ne!(tokens[1], tokens[2]);
    for (_, cache) in seen.iter() {
        assert!(cache.as_deref().unwrap().contains("no-cache"));
    }
}

#[tokio::test]
async fn range_sends_window_minutes_and_limit() {
    let (base, seen) = backend().await;
    let source = HttpSource::new(base).unwrap();

    let points = source.fetch_range(RangeWindow::OneHour, 250).await.unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].id, Some(2), "order is left as received");

    let seen = seen.lock().unwrap();
    let (query, _) = &seen[0];
    assert_eq!(query.get("minutes").map(String::as_str), Some("60"));
    assert_eq!(query.get("limit").map(String::as_str), Some("250"));
}

#[tokio::test]
async fn range_limit_is_clamped_to_what_the_api_accepts() {
    let (base, seen) = backend().await;
    let source = HttpSource::new(base).unwrap();

    source.range(RangeWindow::OneDay, 50_000).await.unwrap();
    source.range(RangeWindow::OneDay, 0).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0["limit"], MAX_RANGE_LIMIT.to_string());
    assert_eq!(seen[0].0["minutes"], "1440");
    assert_eq!(seen[1].0["limit"], "1");
}

#[tokio::test]
async fn null_latest_is_no_data() {
    let app = Router::new().route("/api/latest", get(|| async { Json(json!({ "latest": null })) }));
    let source = HttpSource::new(serve(app).await).unwrap();
    assert!(source.fetch_latest().await.unwrap().is_none());
}

#[tokio::test]
async fn null_points_is_an_empty_range() {
    let app = Router::new().route("/api/range", get(|| async { Json(json!({ "points": null })) }));
    let source = HttpSource::new(serve(app).await).unwrap();
    let points = source.fetch_range(RangeWindow::OneHour, 10).await.unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn not_found_is_no_data() {
    let source = HttpSource::new(serve(Router::new()).await).unwrap();
    assert!(source.fetch_latest().await.unwrap().is_none());
    assert!(
        source
            .fetch_range(RangeWindow::FifteenMinutes, 100)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let app = Router::new().route(
        "/api/latest",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down\n").into_response() }),
    );
    let base = serve(app).await;
    let source = HttpSource::new(base.clone()).unwrap();

    let err = source.fetch_latest().await.unwrap_err();
    match &err {
        DashboardError::Transport { status, url, body } => {
            assert_eq!(*status, 500);
            assert_eq!(url, &format!("{base}/api/latest"));
            assert_eq!(body.as_deref(), Some("database down"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        format!("HTTP 500 from {base}/api/latest\ndatabase down")
    );
}

#[tokio::test]
async fn server_error_without_body_has_no_detail_line() {
    let app = Router::new().route("/api/range", get(|| async { StatusCode::BAD_GATEWAY }));
    let base = serve(app).await;
    let source = HttpSource::new(base.clone()).unwrap();

    let err = source
        .fetch_range(RangeWindow::FiveMinutes, 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DashboardError::Transport {
            status: 502,
            body: None,
            ..
        }
    ));
    assert_eq!(err.to_string(), format!("HTTP 502 from {base}/api/range"));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let app = Router::new().route("/api/latest", get(|| async { "<html>not json</html>" }));
    let source = HttpSource::new(serve(app).await).unwrap();
    let err = source.fetch_latest().await.unwrap_err();
    assert!(matches!(err, DashboardError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_source_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpSource::new(format!("http://{addr}")).unwrap();
    let err = source.fetch_latest().await.unwrap_err();
    assert!(matches!(err, DashboardError::Request(_)), "got {err:?}");
}

#[tokio::test]
async fn health_reports_status() {
    let (base, _) = backend().await;
    let source = HttpSource::new(base).unwrap();
    assert_eq!(source.health().await.unwrap().status, "ok");
}

#[tokio::test]
async fn missing_health_endpoint_is_an_error() {
    let source = HttpSource::new(serve(Router::new()).await).unwrap();
    let err = source.health().await.unwrap_err();
    assert!(matches!(err, DashboardError::Transport { status: 404, .. }));
}
