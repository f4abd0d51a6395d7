// Shared test helpers: snapshot builders and an in-memory metrics source

#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use metricsview::DashboardError;
use metricsview::fetcher::MetricsSource;
use metricsview::models::{MetricSnapshot, RangeWindow};
use tokio::sync::Notify;

pub const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Snapshot with id, timestamp and the three chart percentages.
pub fn snapshot(id: i64, cpu: f64, mem: f64, disk: f64) -> MetricSnapshot {
    MetricSnapshot {
        id: Some(id),
        ts: Some(format!("2024-05-01T12:{:02}:{:02}Z", (id / 60) % 60, id % 60)),
        cpu_percent: Some(cpu),
        mem_percent: Some(mem),
        disk_percent: Some(disk),
        ..Default::default()
    }
}

pub fn with_id(id: i64) -> MetricSnapshot {
    snapshot(id, 10.0, 20.0, 30.0)
}

/// Snapshot with every field populated.
pub fn full_snapshot(id: i64) -> MetricSnapshot {
    MetricSnapshot {
        id: Some(id),
        ts: Some("2024-05-01T12:30:45Z".into()),
        cpu_percent: Some(12.5),
        cpu_per_core_percent: None,
        cpu_user_percent: Some(8.25),
        cpu_system_percent: Some(4.25),
        load_1: Some(1.0),
        load_5: Some(0.5),
        load_15: Some(0.25),
        mem_percent: Some(50.0),
        mem_total_bytes: Some(16.0 * GB),
        mem_used_bytes: Some(8.0 * GB),
        mem_free_bytes: Some(2.0 * GB),
        mem_available_bytes: Some(6.0 * GB),
        disk_mount: Some("/".into()),
        disk_percent: Some(25.0),
        disk_total_bytes: Some(100.0 * GB),
        disk_used_bytes: Some(25.0 * GB),
        disk_free_bytes: Some(75.0 * GB),
    }
}

/// Holds the next fetch until released; `entered` fires once the fetch is in flight.
#[derive(Default)]
pub struct Hold {
    pub entered: Notify,
    pub release: Notify,
}

/// Scripted responses shared between a test and its [`FakeSource`].
#[derive(Default)]
pub struct FakeState {
    latest: Mutex<Option<MetricSnapshot>>,
    points: Mutex<Vec<MetricSnapshot>>,
    fail_status: Mutex<Option<u16>>,
    hold: Mutex<Option<Arc<Hold>>>,
    latest_calls: AtomicUsize,
    range_calls: AtomicUsize,
    last_range: Mutex<Option<(RangeWindow, u32)>>,
}

impl FakeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_latest(&self, snapshot: Option<MetricSnapshot>) {
        *self.latest.lock().unwrap() = snapshot;
    }

    pub fn set_points(&self, points: Vec<MetricSnapshot>) {
        *self.points.lock().unwrap() = points;
    }

    /// Every following fetch fails with this HTTP status (None to recover).
    pub fn fail_with(&self, status: Option<u16>) {
        *self.fail_status.lock().unwrap() = status;
    }

    /// Makes the next fetch wait for `release`.
    pub fn hold_next(&self) -> Arc<Hold> {
        let hold = Arc::new(Hold::default());
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    pub fn range_calls(&self) -> usize {
        self.range_calls.load(Ordering::SeqCst)
    }

    pub fn last_range(&self) -> Option<(RangeWindow, u32)> {
        *self.last_range.lock().unwrap()
    }

    async fn pause_if_held(&self) {
        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
    }

    fn check_failure(&self, path: &str) -> Result<(), DashboardError> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(DashboardError::Transport {
                status,
                url: format!("http://fake{path}"),
                body: Some("scripted failure".into()),
            }),
            None => Ok(()),
        }
    }
}

pub struct FakeSource(pub Arc<FakeState>);

impl MetricsSource for FakeSource {
    fn fetch_latest(
        &self,
    ) -> impl Future<Output = Result<Option<MetricSnapshot>, DashboardError>> + Send {
        let state = self.0.clone();
        async move {
            state.latest_calls.fetch_add(1, Ordering::SeqCst);
            state.pause_if_held().await;
            state.check_failure("/api/latest")?;
            Ok(state.latest.lock().unwrap().clone())
        }
    }

    fn fetch_range(
        &self,
        window: RangeWindow,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<MetricSnapshot>, DashboardError>> + Send {
        let state = self.0.clone();
        async move {
            state.range_calls.fetch_add(1, Ordering::SeqCst);
            *state.last_range.lock().unwrap() = Some((window, limit));
            state.pause_if_held().await;
            state.check_failure("/api/range")?;
            Ok(state.points.lock().unwrap().clone())
        }
    }
}
