//! Global token bucket backing request admission.
//!
//! The pool is a semaphore whose permits are the tokens. Consumers take a
//! permit and forget it; the single refill task puts one back per tick while
//! the pool is below capacity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Errors raised while building or driving a [`TokenBucket`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("bucket capacity must be at least 1")]
    ZeroCapacity,

    #[error("bucket capacity {0} exceeds the maximum pool size")]
    CapacityTooLarge(usize),

    /// Rates above 1000/s truncate to a zero-millisecond interval.
    #[error("refill rate must be between 1 and 1000 tokens per second, got {0}")]
    InvalidRefillRate(u64),

    #[error("refill task already started")]
    AlreadyStarted,

    #[error("no token became available within {0:?}")]
    Timeout(Duration),
}

/// A bounded pool of admission tokens refilled on a fixed schedule.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: Arc<Semaphore>,
    capacity: usize,
    refill_interval: Duration,
    started: AtomicBool,
}

impl TokenBucket {
    /// Create a bucket pre-filled with `capacity` tokens.
    ///
    /// The refill interval is `1000 / refill_rate` milliseconds with integer
    /// truncation, so a rate of 3 ticks every 333ms rather than every third
    /// of a second.
    pub fn new(capacity: usize, refill_rate: u64) -> Result<Self, BucketError> {
        if capacity == 0 {
            return Err(BucketError::ZeroCapacity);
        }
        if capacity > Semaphore::MAX_PERMITS {
            return Err(BucketError::CapacityTooLarge(capacity));
        }
        if refill_rate == 0 || refill_rate > 1000 {
            return Err(BucketError::InvalidRefillRate(refill_rate));
        }

        Ok(Self {
            tokens: Arc::new(Semaphore::new(capacity)),
            capacity,
            refill_interval: Duration::from_millis(1000 / refill_rate),
            started: AtomicBool::new(false),
        })
    }

    /// Launch the background refill task.
    ///
    /// The task adds one token per interval, dropping the tick when the pool
    /// is full, and exits once `shutdown` fires. Only one task may run per
    /// bucket.
    pub fn start(
        &self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<JoinHandle<()>, BucketError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BucketError::AlreadyStarted);
        }

        let tokens = self.tokens.clone();
        let capacity = self.capacity;
        let period = self.refill_interval;

        tracing::info!(
            capacity,
            interval_ms = period.as_millis() as u64,
            "Token bucket refill starting"
        );

        Ok(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        refill(&tokens, capacity);
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Token bucket received shutdown signal, stopping refill");
                        break;
                    }
                }
            }
        }))
    }

    /// Wait until a token is available and take it.
    ///
    /// There is no timeout: once the refill task has stopped, or under
    /// sustained overload, this can wait forever. Waiters are served in the
    /// semaphore's queue order.
    pub async fn consume(&self) {
        let permit = self
            .tokens
            .acquire()
            .await
            .expect("token pool is never closed");
        permit.forget();
    }

    /// Take a token only if one is available right now.
    pub fn try_consume(&self) -> bool {
        match self.tokens.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Like [`consume`](Self::consume), but gives up after `limit`.
    pub async fn consume_timeout(&self, limit: Duration) -> Result<(), BucketError> {
        time::timeout(limit, self.consume())
            .await
            .map_err(|_| BucketError::Timeout(limit))
    }

    /// Snapshot of the tokens currently in the pool.
    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    #[cfg(test)]
    fn tick(&self) -> bool {
        refill(&self.tokens, self.capacity)
    }
}

/// Add one token unless the pool is full.
///
/// Only the refill task adds permits, so the count can only fall between the
/// check and the add.
fn refill(tokens: &Semaphore, capacity: usize) -> bool {
    if tokens.available_permits() < capacity {
        tokens.add_permits(1);
        true
    } else {
        false
    }
}
