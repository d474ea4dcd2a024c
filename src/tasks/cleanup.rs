//! Expiry sweep
//!
//! Reads already drop expired entries lazily. The sweep bounds memory held by
//! entries nobody asks for again, e.g. one-off query strings.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Spawns a task that removes expired entries every `interval`.
///
/// Returns the handle so the caller can abort it on shutdown.
pub fn spawn_cleanup_task(cache: ResponseCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "starting cache expiry sweep"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found no expired entries");
            }
        }
    })
}
