//! Cache Refresh Task
//!
//! Background task that periodically refreshes a snapshot cache.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{Refresh, SnapshotCache};

/// Spawns a background task that refreshes `cache` every `interval`.
///
/// The task runs in an infinite loop, sleeping for the interval before each
/// refresh, so the first tick happens one full interval after spawning.
/// Ticks that land while a fetch is in flight collapse into that fetch.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted when the cache shuts down.
///
/// # Example
/// ```ignore
/// let handle = spawn_refresh_task(cache.clone(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_refresh_task<T>(cache: SnapshotCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            cache = cache.name(),
            "Starting refresh task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.refresh().await {
                Refresh::Installed(_) => debug!(cache = cache.name(), "snapshot refreshed"),
                Refresh::Skipped => debug!(cache = cache.name(), "refresh tick skipped"),
                Refresh::Failed(err) => {
                    warn!(cache = cache.name(), error = %err, "scheduled refresh failed")
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheOptions, Fetch};
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Counter(Arc<AtomicU32>);

    #[async_trait]
    impl Fetch<u32> for Counter {
        async fn fetch(&self) -> Result<u32, FetchError> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_installs_new_snapshots() {
        let counter = Arc::new(AtomicU32::new(0));
        let cache = SnapshotCache::new("ticks", Counter(counter.clone()), CacheOptions::manual());

        let handle = spawn_refresh_task(cache.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        while cache.status().in_flight {
            tokio::task::yield_now().await;
        }

        assert!(counter.load(Ordering::SeqCst) >= 2);
        assert_eq!(*cache.snapshot().unwrap(), counter.load(Ordering::SeqCst));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_task_waits_one_interval() {
        let counter = Arc::new(AtomicU32::new(0));
        let cache = SnapshotCache::new("ticks", Counter(counter.clone()), CacheOptions::manual());

        let handle = spawn_refresh_task(cache.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(cache.snapshot().is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn test_refresh_task_can_be_aborted() {
        let counter = Arc::new(AtomicU32::new(0));
        let cache = SnapshotCache::new("ticks", Counter(counter), CacheOptions::manual());

        let handle = spawn_refresh_task(cache, Duration::from_secs(1));

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
