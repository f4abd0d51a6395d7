// Auto-refresh timer: a cancellable interval task.
// At most one timer is armed per scheduler; re-arming disarms the previous one first.

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// Default period between automatic refreshes in the live view.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5_000);

/// How long `shutdown` waits for a running tick before aborting it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct ArmedTimer {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Recurring trigger for refresh cycles.
///
/// The tick callback is awaited inline, so a slow cycle delays the next tick
/// instead of overlapping it; missed ticks are skipped, not replayed.
#[derive(Default)]
pub struct RefreshScheduler {
    armed: Option<ArmedTimer>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer. The first tick fires one `period` from now.
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    // Fires on explicit stop and when the scheduler is dropped.
                    _ = &mut shutdown_rx => {
                        tracing::debug!("refresh timer disarmed");
                        break;
                    }
                    _ = tick.tick() => on_tick().await,
                }
            }
        });
        tracing::debug!(period_ms = period.as_millis() as u64, "refresh timer armed");
        self.armed = Some(ArmedTimer {
            shutdown_tx,
            handle,
        });
    }

    /// Disarms the timer. A tick callback already running is left to finish.
    /// Returns whether a timer was armed.
    pub fn stop(&mut self) -> bool {
        match self.armed.take() {
            Some(timer) => {
                let _ = timer.shutdown_tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Disarms and waits up to `grace` for a running tick to finish, then aborts it.
    pub async fn shutdown(&mut self, grace: Duration) {
        let Some(mut timer) = self.armed.take() else {
            return;
        };
        let _ = timer.shutdown_tx.send(());
        if tokio::time::timeout(grace, &mut timer.handle).await.is_err() {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "refresh tick still running at shutdown; aborting"
            );
            timer.handle.abort();
            let _ = timer.handle.await;
        }
    }
}
