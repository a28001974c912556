//! Fixed-window rate limiter keyed by caller identity.
//!
//! Windows are not aligned to wall-clock boundaries: each identifier's window
//! starts at its first request after the previous window ran out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{duration_ms, Clock, SystemClock};

// == Rate Limit Config ==
/// Quota applied to one class of requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

// == Rate Limit Record ==
/// Counting state of one identifier's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    /// Window end (Unix milliseconds)
    pub reset_time: u64,
}

// == Rate Limit Decision ==
/// Outcome of a quota check. A rejection is a value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Window end (Unix milliseconds)
    pub reset_at: u64,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at.saturating_sub(now_ms).div_ceil(1000)
    }
}

// == Rate Limiter ==
#[derive(Debug)]
pub struct RateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Creates a limiter reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Current time according to the limiter's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // == Check ==
    /// Counts one request from `identifier` against `max_requests` per `window_secs`.
    ///
    /// Rejected requests leave the record unchanged and do not consume quota.
    pub fn check(&self, identifier: &str, max_requests: u32, window_secs: u64) -> RateLimitDecision {
        let now = self.clock.now_ms();
        let mut records = self.lock();

        match records.get_mut(identifier) {
            Some(record) if now < record.reset_time => {
                if record.count < max_requests {
                    record.count += 1;
                    RateLimitDecision {
                        allowed: true,
                        remaining: max_requests - record.count,
                        reset_at: record.reset_time,
                    }
                } else {
                    debug!(identifier, count = record.count, "Rate limit exceeded");
                    RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: record.reset_time,
                    }
                }
            }
            _ => {
                let reset_time = now.saturating_add(duration_ms(Duration::from_secs(window_secs)));
                records.insert(
                    identifier.to_string(),
                    RateLimitRecord {
                        count: 1,
                        reset_time,
                    },
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: max_requests.saturating_sub(1),
                    reset_at: reset_time,
                }
            }
        }
    }

    pub fn check_with(&self, identifier: &str, config: &RateLimitConfig) -> RateLimitDecision {
        self.check(identifier, config.max_requests, config.window_secs)
    }

    // == Sweep ==
    /// Drops records whose window has ended. Returns the number removed.
    ///
    /// Housekeeping only: `check` already ignores stale records.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| now < record.reset_time);
        before - records.len()
    }

    /// Forgets an identifier's window.
    pub fn reset(&self, identifier: &str) -> bool {
        self.lock().remove(identifier).is_some()
    }

    pub fn record(&self, identifier: &str) -> Option<RateLimitRecord> {
        self.lock().get(identifier).copied()
    }

    /// Number of tracked identifiers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map holds plain counters, so a panic elsewhere cannot leave it inconsistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
