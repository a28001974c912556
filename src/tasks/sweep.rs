//! Rate limit sweep task
//!
//! Periodically drops rate-limit records whose window has ended so the map
//! does not grow with every client ever seen.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ratelimit::RateLimiter;

/// Spawns the sweep loop. Abort the returned handle on shutdown.
pub fn spawn_sweep_task(limiter: Arc<RateLimiter>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting rate limit sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = limiter.sweep_expired();
            if removed > 0 {
                debug!(removed, remaining = limiter.len(), "Swept expired rate limit records");
            }
        }
    })
}
