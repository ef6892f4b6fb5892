//! Global rate governor for outbound fetches.
//!
//! Every fetch attempt in the process funnels through one [`RateGovernor`]
//! before hitting the network, so the total outbound request rate to the
//! target site stays bounded no matter how many searches run concurrently.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes outbound request starts with a minimum inter-request interval.
///
/// The mutex over the last-release instant is held across the sleep, so
/// concurrent callers queue up rather than each sleeping independently.
/// A per-caller timer would multiply the effective request rate.
pub struct RateGovernor {
    delay: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl RateGovernor {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_release: Mutex::new(None),
        }
    }

    /// Blocks until at least the configured delay has elapsed since the
    /// previous `acquire` returned, process-wide. Cannot fail, only delay.
    pub async fn acquire(&self) {
        let mut last = self.last_release.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.delay;
            let now = Instant::now();
            if ready_at > now {
                tokio::time::sleep(ready_at - now).await;
            }
        }
        *last = Some(Instant::now());
    }
}
