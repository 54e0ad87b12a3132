/*!
 * Minimum spacing between outgoing translation calls.
 */

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Engine-wide request spacer
///
/// Every `acquire` reserves the next free slot under a short lock and then
/// sleeps until that slot, so two grants are never closer than `min_interval`
/// no matter how many tasks call in at once. Waiters are not queued fairly.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_granted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_granted: Mutex::new(None),
        }
    }

    /// Configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next permitted send time and return it
    pub async fn acquire(&self) -> Instant {
        let slot = self.reserve(Instant::now());
        if slot > Instant::now() {
            sleep_until(slot).await;
        }
        slot
    }

    // Read-compare-update of the shared timestamp; must stay under one lock.
    fn reserve(&self, now: Instant) -> Instant {
        let mut last = self.last_granted.lock();
        let slot = match *last {
            Some(previous) => now.max(previous + self.min_interval),
            None => now,
        };
        *last = Some(slot);
        slot
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
