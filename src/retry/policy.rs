//! Retry policy and the backoff loop.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retry::{Classify, ErrorKind};

/// Multiplier applied to the delay after each failed attempt.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

// == Retry Policy ==
/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Upper bound on invocations of the operation. 0 is treated as 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default 1.5x backoff.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay following `delay`. A multiplier that cannot produce a valid
    /// duration keeps the delay unchanged.
    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier).unwrap_or(delay)
    }

    /// Longest total time spent sleeping when every attempt fails transiently.
    ///
    /// Equals the geometric sum of the `max_attempts - 1` waits, which stays
    /// below `initial_delay * (b^max_attempts - 1) / (b - 1)`.
    pub fn max_total_delay(&self) -> Duration {
        let mut delay = self.initial_delay;
        let mut total = Duration::ZERO;
        for _ in 1..self.attempts() {
            total = total.saturating_add(delay);
            delay = self.next_delay(delay);
        }
        total
    }
}

// == With Retry ==
/// Runs `operation` under `policy`, classifying failures through [`Classify`].
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    with_retry_classified(policy, |error: &E| Classify::kind(error), operation).await
}

/// Runs `operation` under `policy`, classifying failures with `classify`.
///
/// Only [`ErrorKind::Transient`] failures are retried. Any other kind, or a
/// transient failure on the last attempt, is returned to the caller as is.
pub async fn with_retry_classified<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    classify: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> ErrorKind,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let kind = classify(&error);
        if !kind.is_retryable() {
            debug!(attempt, ?kind, %error, "Non-retryable failure");
            return Err(error);
        }
        if attempt >= max_attempts {
            warn!(attempts = attempt, %error, "Giving up after transient failures");
            return Err(error);
        }

        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            %error,
            "Transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
        attempt += 1;
    }
}
