//! Minimum-interval rate limiter.
//!
//! Each limiter owns its last-call timestamp, so two clients never throttle
//! each other. Create one per client instance.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a call made at `now` has to wait.
    pub fn wait_time(&self, now: Instant) -> Duration {
        let last = *self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match last {
            None => Duration::ZERO,
            Some(prev) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(prev)),
        }
    }

    /// Blocks until the interval since the previous call has elapsed, then
    /// records this call. Holding the lock while sleeping serializes callers.
    pub fn acquire(&self) {
        let mut last = self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            let wait = self.min_interval.saturating_sub(prev.elapsed());
            if !wait.is_zero() {
                tracing::debug!("rate limit: waiting {:?}", wait);
                std::thread::sleep(wait);
            }
        }
        *last = Some(Instant::now());
    }
}
