//! Clock adapters.

use crate::ports::Clock;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::time::Instant;

/// Wall time derived from a monotonic reading.
///
/// Captures the wall clock once and advances it with `tokio::time::Instant`,
/// so token expiry never moves backwards when the system clock is adjusted
/// and paused-time tests see the same clock the rotation timer does.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Clock reading `wall` right now.
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall: wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed =
            ChronoDuration::from_std(self.anchor.elapsed()).unwrap_or_else(|_| ChronoDuration::zero());
        self.anchor_wall + elapsed
    }
}
