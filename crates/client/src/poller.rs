//! Cancellable background polling.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to a background loop that runs a tick every `period`.
///
/// The loop ends when a tick returns `ControlFlow::Break`, when
/// [`PollHandle::cancel`] is called, or when the handle is dropped.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
    period: Duration,
}

impl PollHandle {
    /// Spawn a loop whose first tick runs one `period` from now.
    ///
    /// Ticks never overlap: a slow tick delays the next one instead of
    /// queueing catch-up ticks.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero or if called outside a tokio runtime.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tick().await.is_break() {
                    break;
                }
            }
        });

        Self { task, period }
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Whether the loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling.
    pub fn cancel(self) {
        drop(self);
    }

    /// Wait until the loop ends by itself.
    pub async fn finished(mut self) {
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
