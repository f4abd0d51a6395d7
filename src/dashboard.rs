// Dashboard controller: owns the view state, live buffer, scheduler and sink,
// and runs refresh cycles (fetch -> buffer/summarize -> format -> render).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, EmptyResult, Result};
use crate::fetcher::{DEFAULT_RANGE_LIMIT, MetricsSource};
use crate::format::{self, Category, Frame};
use crate::live_buffer::{DEFAULT_CAPACITY, LiveBuffer};
use crate::models::{MetricSnapshot, ViewMode};
use crate::scheduler::{DEFAULT_INTERVAL, RefreshScheduler, SHUTDOWN_GRACE};
use crate::sink::{
    RenderSink, STATUS_ERROR, STATUS_LOADING, STATUS_READY, STATUS_STALE,
};
use crate::view_mode::{SchedulerCommand, Transition, UserAction, ViewState};

/// Tunables for one dashboard instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub refresh_interval: Duration,
    pub range_limit: u32,
    pub buffer_capacity: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_INTERVAL,
            range_limit: DEFAULT_RANGE_LIMIT,
            buffer_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Why a trigger did not run a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another cycle is in flight; the trigger is dropped, not queued.
    Busy,
    /// Timer fired after the view left Latest.
    NotLatest,
}

/// Result of one refresh trigger.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// All three categories were rendered from one payload.
    Rendered(ViewMode),
    Skipped(SkipReason),
    /// The view changed while fetching; the payload was discarded and the
    /// status asks for a manual refresh.
    Stale {
        requested: ViewMode,
        current: ViewMode,
    },
    /// Nothing rendered; status and error banner were updated.
    Failed(DashboardError),
}

impl RefreshOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RefreshOutcome::Rendered(_))
    }
}

enum Payload {
    Latest(Option<MetricSnapshot>),
    Range(Vec<MetricSnapshot>),
}

/// Clears the busy flag on drop, so every exit path of a cycle releases it.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<S, K> {
    source: S,
    sink: Mutex<K>,
    view: Mutex<ViewState>,
    buffer: Mutex<LiveBuffer>,
    scheduler: Mutex<RefreshScheduler>,
    busy: AtomicBool,
    settings: DashboardSettings,
}

/// Handle to one dashboard instance. Clones share the same state.
pub struct Dashboard<S, K> {
    inner: Arc<Inner<S, K>>,
}

impl<S, K> Clone for Dashboard<S, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: MetricsSource, K: RenderSink> Dashboard<S, K> {
    pub fn new(source: S, sink: K, settings: DashboardSettings, initial: ViewState) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                sink: Mutex::new(sink),
                view: Mutex::new(initial),
                buffer: Mutex::new(LiveBuffer::new(settings.buffer_capacity)),
                scheduler: Mutex::new(RefreshScheduler::new()),
                busy: AtomicBool::new(false),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> DashboardSettings {
        self.inner.settings
    }

    pub fn view_state(&self) -> ViewState {
        *lock(&self.inner.view)
    }

    /// Current view, read fresh on every call.
    pub fn view_mode(&self) -> ViewMode {
        self.view_state().view_mode()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    pub fn is_auto_refresh_armed(&self) -> bool {
        lock(&self.inner.scheduler).is_armed()
    }

    pub fn with_sink<R>(&self, f: impl FnOnce(&K) -> R) -> R {
        f(&lock(&self.inner.sink))
    }

    pub fn with_buffer<R>(&self, f: impl FnOnce(&LiveBuffer) -> R) -> R {
        f(&lock(&self.inner.buffer))
    }

    /// Enters the initial view: syncs the timer and indicators, then runs the first cycle.
    pub async fn start(&self) -> RefreshOutcome {
        let entered = self.view_state().enter();
        match self.apply(entered).await {
            Some(outcome) => outcome,
            None => self.refresh().await,
        }
    }

    /// Applies a user action. Returns the cycle outcome if the action triggered one.
    pub async fn handle(&self, action: UserAction) -> Option<RefreshOutcome> {
        let transition = self.view_state().apply(action);
        debug!(?action, view = %transition.state.view_mode(), "user action");
        self.apply(transition).await
    }

    async fn apply(&self, transition: Transition) -> Option<RefreshOutcome> {
        *lock(&self.inner.view) = transition.state;
        {
            let mut sink = lock(&self.inner.sink);
            sink.set_auto_refresh_visible(transition.auto_refresh_visible);
            sink.set_range_controls_visible(transition.range_controls_visible);
        }
        match transition.scheduler {
            SchedulerCommand::Start => self.arm_auto_refresh(),
            SchedulerCommand::Stop => {
                lock(&self.inner.scheduler).stop();
            }
            SchedulerCommand::Keep => {}
        }
        if transition.refresh {
            Some(self.refresh().await)
        } else {
            None
        }
    }

    fn arm_auto_refresh(&self) {
        let weak = Arc::downgrade(&self.inner);
        lock(&self.inner.scheduler).start(self.inner.settings.refresh_interval, move || {
            let weak = weak.clone();
            async move {
                if let Some(inner) = weak.upgrade() {
                    Dashboard { inner }.refresh_if_latest().await;
                }
            }
        });
    }

    /// Disarms auto-refresh. A timer tick still fetching after the grace period is aborted.
    pub async fn shutdown(&self) {
        let mut scheduler = std::mem::take(&mut *lock(&self.inner.scheduler));
        scheduler.shutdown(SHUTDOWN_GRACE).await;
    }

    /// Timer entry point: runs a cycle only if the view is still Latest at fire time.
    pub async fn refresh_if_latest(&self) -> RefreshOutcome {
        if !self.view_mode().is_latest() {
            debug!("auto-refresh tick outside latest view; ignored");
            return RefreshOutcome::Skipped(SkipReason::NotLatest);
        }
        self.refresh().await
    }

    /// Runs one refresh cycle for the current view. Dropped if a cycle is already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.inner.busy) else {
            debug!("refresh in progress; trigger dropped");
            return RefreshOutcome::Skipped(SkipReason::Busy);
        };

        let requested = self.view_mode();
        debug!(view = %requested, operation = "refresh", "refresh cycle started");
        {
            let mut sink = lock(&self.inner.sink);
            sink.clear_error();
            sink.set_status(STATUS_LOADING);
            sink.set_last_poll(&format::now_time_of_day());
        }

        let fetched = self.fetch(requested).await;

        let current = self.view_mode();
        if current != requested {
            info!(
                requested = %requested,
                current = %current,
                "view changed during fetch; result discarded, refresh to load the current view"
            );
            lock(&self.inner.sink).set_status(STATUS_STALE);
            return RefreshOutcome::Stale { requested, current };
        }

        match fetched.and_then(|payload| self.build_frame(payload)) {
            Ok(frame) => {
                self.render(&frame);
                RefreshOutcome::Rendered(requested)
            }
            Err(e) => {
                warn!(error = %e, view = %requested, operation = "refresh", "refresh cycle failed");
                let mut sink = lock(&self.inner.sink);
                sink.set_status(STATUS_ERROR);
                sink.show_error(&e.to_string());
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn fetch(&self, view: ViewMode) -> Result<Payload> {
        match view {
            ViewMode::Latest => self.inner.source.fetch_latest().await.map(Payload::Latest),
            ViewMode::Range { window } => self
                .inner
                .source
                .fetch_range(window, self.inner.settings.range_limit)
                .await
                .map(Payload::Range),
        }
    }

    fn build_frame(&self, payload: Payload) -> Result<Frame> {
        match payload {
            Payload::Latest(None) => Err(DashboardError::EmptyResult(EmptyResult::NoLatest)),
            Payload::Latest(Some(row)) => {
                let mut buffer = lock(&self.inner.buffer);
                if !buffer.ingest(row.clone()) {
                    debug!(id = ?row.id, "latest snapshot unchanged since last poll");
                }
                Ok(format::latest_frame(&row, buffer.snapshots(), &Local))
            }
            Payload::Range(points) => {
                let ordered = format::order_by_timestamp(points);
                format::range_frame(&ordered, &Local)
                    .ok_or(DashboardError::EmptyResult(EmptyResult::EmptyRange))
            }
        }
    }

    /// Puts a whole frame on screen under one sink lock.
    fn render(&self, frame: &Frame) {
        let mut sink = lock(&self.inner.sink);
        for category in Category::ALL {
            sink.render_table(category, frame.tables.get(category));
            sink.render_chart(category, frame.charts.get(category));
        }
        sink.set_last_updated(&frame.last_updated);
        sink.set_status(STATUS_READY);
    }
}
