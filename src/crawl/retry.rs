//! Bounded retry with polite, randomized pauses

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// A random pause drawn uniformly from `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoliteDelay {
    min: Duration,
    max: Duration,
}

impl PoliteDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No pause at all
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Draw one pause length
    pub fn sample(&self) -> Duration {
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    /// Sleep for a freshly drawn pause
    pub async fn pause(&self) {
        let wait = self.sample();
        if !wait.is_zero() {
            trace!("Polite delay: {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Retry an operation up to `max_attempts` times, pausing between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: PoliteDelay,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: PoliteDelay) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> PoliteDelay {
        self.delay
    }

    /// Run `operation` until it succeeds or the attempts are used up
    ///
    /// The closure receives the 1-based attempt number. The error of the
    /// final attempt is returned when every attempt fails.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    debug!(
                        "Attempt {}/{} failed: {}; retrying",
                        attempt, self.max_attempts, e
                    );
                    self.delay.pause().await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
