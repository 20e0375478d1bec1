//! Global token-bucket rate limiter
//!
//! The bucket is a semaphore holding up to `requests_per_second` permits. It
//! starts full, so the first `capacity` requests go out without delay, and a
//! background task adds one permit every `1s / requests_per_second` while the
//! bucket is below capacity. Refills that find the bucket full are discarded.

use crate::ConfigError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Highest rate whose refill period is still at least one nanosecond
pub const MAX_REQUESTS_PER_SECOND: u32 = 1_000_000_000;

/// Token bucket bounding the outbound request rate across all workers
#[derive(Debug)]
pub struct RateLimiter {
    tokens: Arc<Semaphore>,
    capacity: usize,
    refill_interval: Duration,
    refill_task: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Creates a full bucket and starts the refill task
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if `requests_per_second` is 0 or
    /// above [`MAX_REQUESTS_PER_SECOND`].
    pub fn new(requests_per_second: u32) -> Result<Self, ConfigError> {
        if !(1..=MAX_REQUESTS_PER_SECOND).contains(&requests_per_second) {
            return Err(ConfigError::Validation(format!(
                "requests_per_second must be between 1 and {}, got {}",
                MAX_REQUESTS_PER_SECOND, requests_per_second
            )));
        }

        let capacity = requests_per_second as usize;
        let refill_interval = Duration::from_secs(1) / requests_per_second;
        let tokens = Arc::new(Semaphore::new(capacity));

        let refill_task = tokio::spawn(refill(Arc::clone(&tokens), capacity, refill_interval));

        Ok(Self {
            tokens,
            capacity,
            refill_interval,
            refill_task: Mutex::new(Some(refill_task)),
        })
    }

    /// Waits for a token or for `cancel` to fire
    ///
    /// Returns true if a token was consumed. Returns false when the wait was
    /// cut short by cancellation or by [`shutdown`](Self::shutdown); the caller
    /// then proceeds unthrottled only because the run is ending.
    pub async fn acquire(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            permit = self.tokens.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            },
        }
    }

    /// Number of tokens currently in the bucket
    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Stops refills and releases any waiters
    ///
    /// Pending and future `acquire` calls return false immediately.
    pub fn shutdown(&self) {
        let task = self
            .refill_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.tokens.close();
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn refill(tokens: Arc<Semaphore>, capacity: usize, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if tokens.is_closed() {
            break;
        }
        // only this task adds permits, so the check cannot overshoot capacity
        if tokens.available_permits() < capacity {
            tokens.add_permits(1);
        }
    }
}
