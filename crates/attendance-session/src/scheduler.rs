//! Session Rotation Scheduler
//!
//! A cancellable periodic task. The first tick fires one period after
//! spawn; the tick callback decides whether the task keeps running.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle to a running rotation task.
///
/// Dropping the handle detaches the task; only [`RotationTimer::cancel`]
/// stops it. A tick already past its await point when `cancel` runs may
/// still complete, so tick callbacks must check liveness themselves.
#[derive(Debug)]
pub struct RotationTimer {
    handle: JoinHandle<()>,
}

impl RotationTimer {
    /// Spawn a task calling `on_tick` every `period` until it returns
    /// `ControlFlow::Break`.
    pub fn spawn<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // A stalled runtime should not produce a burst of rotations.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if on_tick().await.is_break() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Stop the task at its next await point.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
