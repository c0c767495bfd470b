//! Request pacing
//!
//! Enforces a minimum interval between outbound calls issued by one client
//! instance. Pacing is measured from call issuance, not completion.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Minimum-interval rate limiter
///
/// The timestamp of the last issued call sits behind an async mutex that is
/// held across the wait, so concurrent callers sharing one limiter are
/// serialized and still observe the spacing.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing at most `max_requests_per_second` calls
    ///
    /// A rate of zero is treated as one request per second.
    pub fn per_second(max_requests_per_second: u32) -> Self {
        Self::with_interval(Duration::from_secs(1) / max_requests_per_second.max(1))
    }

    /// Create a limiter with an explicit minimum spacing
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Minimum spacing between calls
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a call may be issued, then record the issuance time
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_request.lock().await;

        let waited = match *last {
            Some(previous) => {
                let elapsed = previous.elapsed();
                if elapsed < self.min_interval {
                    let wait = self.min_interval - elapsed;
                    trace!("Rate limiter holding request for {:?}", wait);
                    sleep(wait).await;
                    wait
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };

        *last = Some(Instant::now());
        crate::metrics::record_rate_limit_wait(waited);
        waited
    }
}
