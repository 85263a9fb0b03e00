//! Rate limiter for outbound position updates.
//!
//! Not a timer: the caller asks on every tick and gets at most one "yes" per
//! interval. Ticks in between are coalesced, never queued.

use std::time::{Duration, Instant};

/// Default spacing between position updates.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(50);

/// Gate that opens at most once per `interval`.
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PublishThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// `true` if at least one interval has passed since the last `true`.
    /// The first call always succeeds.
    pub fn ready(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

impl Default for PublishThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISH_INTERVAL)
    }
}
