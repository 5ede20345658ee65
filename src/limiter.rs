//! Outbound-probe throttling: a lazily refilled token bucket shared by all
//! concurrent pipelines, plus bounded retry with pluggable backoff.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// A wait or backoff sleep was interrupted by cancellation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

struct Bucket {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket with lazy refill: tokens are credited on `wait`, not by a
/// background timer. One mutex guards the state and is deliberately held
/// across the blocked sleep, so competing callers are not granted tokens in
/// request order — whoever takes the lock next wins.
pub struct RateLimiter {
    rate: u32,
    interval: Duration,
    state: Mutex<Bucket>,
}

impl RateLimiter {
    /// `rate` tokens per bucket, one token credited every `interval`.
    ///
    /// A rate of 0 can never grant a token; callers treat 0 as "unlimited"
    /// and skip constructing a limiter at all.
    pub fn new(rate: u32, interval: Duration) -> Self {
        Self {
            rate,
            interval,
            state: Mutex::new(Bucket {
                tokens: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Limiter granting `rate` tokens per second.
    pub fn per_second(rate: u32) -> Self {
        Self::new(rate, Duration::from_secs(1) / rate.max(1))
    }

    /// Take one token, blocking until one becomes available or `cancel`
    /// fires. After a blocked wait the caller jump-starts a fresh window:
    /// `tokens = rate - 1`, refill clock reset to now.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let mut bucket = self.state.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill);

        if !self.interval.is_zero() {
            let to_add = (elapsed.as_nanos() / self.interval.as_nanos())
                .min(u128::from(self.rate)) as u32;
            if to_add > 0 {
                bucket.tokens = (bucket.tokens + to_add).min(self.rate);
                bucket.last_refill = now;
            }
        }

        if bucket.tokens > 0 {
            bucket.tokens -= 1;
            return Ok(());
        }

        let wait_time = self.interval.saturating_sub(elapsed);
        if !wait_time.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Cancelled),
                _ = sleep(wait_time) => {
                    bucket.tokens = self.rate.saturating_sub(1);
                    bucket.last_refill = Instant::now();
                }
            }
        }

        Ok(())
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }
}

/// Delay policy for `Retryer`: a pure function of the attempt number.
/// Attempt 0 is the initial try and never sleeps; `delay` is only consulted
/// for attempts 1 and up.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    Linear { base: Duration },
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Linear { base } => base.saturating_mul(attempt),
            Backoff::Exponential { base, max } => {
                let shift = attempt.saturating_sub(1).min(31);
                base.saturating_mul(1u32 << shift).min(max)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E: fmt::Display> {
    #[error("cancelled while backing off")]
    Cancelled,
    #[error("retries exhausted: {0}")]
    Exhausted(E),
}

/// Runs a fallible operation up to `max_retries + 1` times, sleeping out
/// the backoff delay before each re-attempt.
pub struct Retryer {
    max_retries: u32,
    backoff: Backoff,
}

impl Retryer {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Returns the first success, or the last error once every attempt has
    /// failed. A cancelled backoff sleep aborts the whole retry.
    pub async fn execute<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = sleep(self.backoff.delay(attempt)) => {}
                }
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => last_err = Some(err),
            }
        }
        Err(RetryError::Exhausted(
            last_err.expect("at least one attempt always runs"),
        ))
    }
}
