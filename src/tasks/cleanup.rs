//! TTL Sweep Task
//!
//! Background task that periodically removes expired entries from a
//! group's cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::GuardedCache;

/// Spawns a background task sweeping expired entries from `cache`.
///
/// The task ticks forever at `period`; each tick runs one expiry pass
/// under the cache's lock. The returned handle can be aborted to stop
/// the sweeper; a group aborts its sweeper when it is dropped.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweep_task(cache: GuardedCache, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs_f64(), "starting TTL sweep task");

        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; skip it so sweeps start
        // one full period after construction.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.clean_expired();
            if removed > 0 {
                info!(removed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found nothing to remove");
            }
        }
    })
}
