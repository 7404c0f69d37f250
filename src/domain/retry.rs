//! Retry policy for data acquisition, with injectable time.
//!
//! Attempt `n` (counting from 0) waits `backoff.delay(n)` before running; the
//! first attempt never waits. Production code sleeps on the thread; tests swap
//! in a [`Sleeper`] that only records.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub trait Backoff {
    /// Delay before retry number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration;
}

/// `base × attempt + jitter`, jitter drawn uniformly from `jitter_min..=jitter_max`.
#[derive(Debug, Clone)]
pub struct LinearJitterBackoff {
    pub base: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for LinearJitterBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            jitter_min: Duration::from_millis(100),
            jitter_max: Duration::from_millis(500),
        }
    }
}

impl Backoff for LinearJitterBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_max > self.jitter_min {
            rand::thread_rng().gen_range(self.jitter_min..=self.jitter_max)
        } else {
            self.jitter_min
        };
        self.base.saturating_mul(attempt).saturating_add(jitter)
    }
}

/// Linear backoff with no randomness.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    pub base: Duration,
}

impl Backoff for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy<B> {
    pub max_attempts: u32,
    pub backoff: B,
}

impl Default for RetryPolicy<LinearJitterBackoff> {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: LinearJitterBackoff::default(),
        }
    }
}

/// How a failed attempt is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError<E> {
    /// Worth another try; carries the reason for the log and the final error.
    Retry(String),
    /// Stop immediately and surface the error.
    Abort(E),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    Exhausted { attempts: u32, last_reason: String },
    Aborted(E),
}

impl<B: Backoff> RetryPolicy<B> {
    /// Runs `op` until it succeeds, aborts, or `max_attempts` attempts have
    /// failed. `op` receives the 0-based attempt number.
    pub fn run<T, E>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut(u32) -> Result<T, AttemptError<E>>,
    ) -> Result<T, RetryError<E>> {
        let max_attempts = self.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 0..max_attempts {
            if attempt > 0 {
                sleeper.sleep(self.backoff.delay(attempt));
            }
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Abort(e)) => return Err(RetryError::Aborted(e)),
                Err(AttemptError::Retry(reason)) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        %reason,
                        "attempt failed"
                    );
                    last_reason = reason;
                }
            }
        }

        Err(RetryError::Exhausted {
            attempts: max_attempts,
            last_reason,
        })
    }
}
