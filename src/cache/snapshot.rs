//! Snapshot Cache Module
//!
//! A cache holding one immutable value that is replaced wholesale by a
//! configured fetch function, either on demand or on a recurring timer.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::RefreshStats;
use crate::error::FetchError;
use crate::tasks::spawn_refresh_task;

// == Fetch Trait ==
/// Produces a fresh value for a snapshot cache.
///
/// Timeouts and retries belong to the implementation; the cache runs each
/// fetch to completion.
#[async_trait]
pub trait Fetch<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, FetchError>;
}

/// Callback invoked with `(cache_name, error)` each time a refresh fails.
pub type ErrorHandler = Box<dyn Fn(&str, &FetchError) + Send + Sync>;

// == Cache Options ==
/// Scheduling options fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Period of the background refresh timer
    pub interval: Duration,
    /// Whether the background timer runs at all
    pub auto_refresh: bool,
}

impl CacheOptions {
    pub fn new(interval: Duration, auto_refresh: bool) -> Self {
        Self {
            interval,
            auto_refresh,
        }
    }

    /// Options for a cache that only refreshes when asked to.
    pub fn manual() -> Self {
        Self::new(Duration::from_secs(3600), false)
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), true)
    }
}

// == Refresh Outcome ==
/// Result of a single `refresh()` call.
#[derive(Debug)]
pub enum Refresh<T> {
    /// A fetch was already running, or the cache is shut down
    Skipped,
    /// The fetch succeeded and its value is now the snapshot
    Installed(Arc<T>),
    /// The fetch failed; the previous snapshot (if any) is kept
    Failed(FetchError),
}

// == Cache Status ==
/// Point-in-time view of a cache, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub name: String,
    /// A snapshot has been installed
    pub ready: bool,
    pub in_flight: bool,
    pub last_error: Option<String>,
    /// Share of fetches that failed
    pub failure_rate: f64,
    pub stats: RefreshStats,
}

struct CacheState<T> {
    snapshot: Option<Arc<T>>,
    in_flight: bool,
    last_error: Option<FetchError>,
    closed: bool,
    stats: RefreshStats,
}

struct Inner<T> {
    name: String,
    fetcher: Arc<dyn Fetch<T>>,
    state: Mutex<CacheState<T>>,
    /// Bumped every time a fetch settles or the cache closes
    settled: watch::Sender<u64>,
    handlers: Mutex<Vec<ErrorHandler>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

fn lock<M>(mutex: &Mutex<M>) -> MutexGuard<'_, M> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Inner<T> {
    fn state(&self) -> MutexGuard<'_, CacheState<T>> {
        lock(&self.state)
    }

    /// Applies a fetch result, wakes waiters, then runs error handlers.
    fn settle(&self, result: Result<T, FetchError>) -> Refresh<T> {
        let outcome = {
            let mut state = self.state();
            state.in_flight = false;
            if state.closed {
                debug!(cache = %self.name, "discarding fetch result after shutdown");
                Refresh::Failed(FetchError::Closed)
            } else {
                match result {
                    Ok(value) => {
                        let snapshot = Arc::new(value);
                        state.snapshot = Some(Arc::clone(&snapshot));
                        state.last_error = None;
                        state.stats.record_refresh();
                        Refresh::Installed(snapshot)
                    }
                    Err(err) => {
                        state.last_error = Some(err.clone());
                        state.stats.record_failure();
                        Refresh::Failed(err)
                    }
                }
            }
        };

        self.settled.send_modify(|epoch| *epoch += 1);

        match &outcome {
            Refresh::Failed(FetchError::Closed) => {}
            Refresh::Failed(err) => self.notify(err),
            _ => {}
        }
        outcome
    }

    fn notify(&self, err: &FetchError) {
        let handlers = lock(&self.handlers);
        for handler in handlers.iter() {
            let delivered = catch_unwind(AssertUnwindSafe(|| handler(&self.name, err)));
            if delivered.is_err() {
                warn!(cache = %self.name, "fetch error handler panicked");
            }
        }
    }
}

/// Owns the in-flight flag for the duration of one fetch.
///
/// Dropping it without settling (panic or task cancellation) records the
/// fetch as interrupted, so the flag can never stay set.
struct InFlight<T> {
    inner: Arc<Inner<T>>,
    done: bool,
}

impl<T> InFlight<T> {
    fn settle(mut self, result: Result<T, FetchError>) -> Refresh<T> {
        self.done = true;
        self.inner.settle(result)
    }
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        if !self.done {
            self.inner.settle(Err(FetchError::Interrupted));
        }
    }
}

// == Snapshot Cache ==
/// Handle to a self-refreshing snapshot cache.
///
/// Clones share the same state. The snapshot is absent until the first
/// fetch succeeds; after that it is only ever replaced whole.
pub struct SnapshotCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SnapshotCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> SnapshotCache<T> {
    // == Constructor ==
    /// Creates a cache with no snapshot.
    ///
    /// With `auto_refresh` the background timer starts immediately, so this
    /// must be called inside a tokio runtime. A zero interval never starts
    /// the timer. The first population stays
    /// lazy: it happens on the first `get_config()` or timer tick.
    pub fn new<F>(name: impl Into<String>, fetcher: F, options: CacheOptions) -> Self
    where
        F: Fetch<T> + 'static,
    {
        let (settled, _) = watch::channel(0);
        let cache = Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher: Arc::new(fetcher),
                state: Mutex::new(CacheState {
                    snapshot: None,
                    in_flight: false,
                    last_error: None,
                    closed: false,
                    stats: RefreshStats::new(),
                }),
                settled,
                handlers: Mutex::new(Vec::new()),
                timer: Mutex::new(None),
            }),
        };

        if options.auto_refresh {
            if options.interval.is_zero() {
                warn!(
                    cache = %cache.inner.name,
                    "zero refresh interval, background refresh disabled"
                );
            } else {
                let handle = spawn_refresh_task(cache.clone(), options.interval);
                *lock(&cache.inner.timer) = Some(handle);
            }
        }
        cache
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // == Get Config ==
    /// Returns the current snapshot.
    ///
    /// On a cold cache this waits for the first fetch to settle, starting
    /// one if none is running, and returns its error on failure. Once a
    /// snapshot exists it is returned immediately, even while a background
    /// refresh is running.
    pub async fn get_config(&self) -> Result<Arc<T>, FetchError> {
        loop {
            let mut settled = self.inner.settled.subscribe();
            {
                let state = self.inner.state();
                if let Some(snapshot) = &state.snapshot {
                    return Ok(Arc::clone(snapshot));
                }
                if state.closed {
                    return Err(FetchError::Closed);
                }
            }

            match self.refresh().await {
                Refresh::Installed(snapshot) => return Ok(snapshot),
                Refresh::Failed(err) => return Err(err),
                Refresh::Skipped => {
                    // Another caller owns the cold fetch; wait for it.
                    if settled.changed().await.is_err() {
                        return Err(FetchError::Closed);
                    }
                    let state = self.inner.state();
                    if let Some(snapshot) = &state.snapshot {
                        return Ok(Arc::clone(snapshot));
                    }
                    if state.closed {
                        return Err(FetchError::Closed);
                    }
                    if let Some(err) = &state.last_error {
                        return Err(err.clone());
                    }
                }
            }
        }
    }

    // == Refresh ==
    /// Runs the fetch function unless one is already in flight.
    ///
    /// The fetch itself runs on its own task, so dropping the returned
    /// future does not abandon the in-flight flag.
    pub async fn refresh(&self) -> Refresh<T> {
        {
            let mut state = self.inner.state();
            if state.closed {
                return Refresh::Skipped;
            }
            if state.in_flight {
                state.stats.record_skip();
                debug!(cache = %self.inner.name, "fetch already in flight, skipping refresh");
                return Refresh::Skipped;
            }
            state.in_flight = true;
        }

        let guard = InFlight {
            inner: Arc::clone(&self.inner),
            done: false,
        };
        let task = tokio::spawn(async move {
            let result = guard.inner.fetcher.fetch().await;
            guard.settle(result)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(_) => Refresh::Failed(FetchError::Interrupted),
        }
    }

    // == Error Subscription ==
    /// Registers a handler called synchronously on every failed refresh.
    ///
    /// Handlers run after the cache has recorded the failure; a panicking
    /// handler is logged and the remaining handlers still run. A handler must
    /// not register further handlers on the same cache.
    pub fn on_fetch_error<H>(&self, handler: H)
    where
        H: Fn(&str, &FetchError) + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).push(Box::new(handler));
    }

    /// Current snapshot without triggering a fetch.
    pub fn snapshot(&self) -> Option<Arc<T>> {
        self.inner.state().snapshot.clone()
    }

    /// Error of the most recent fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.state().last_error.clone()
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.inner.state();
        CacheStatus {
            name: self.inner.name.clone(),
            ready: state.snapshot.is_some(),
            in_flight: state.in_flight,
            last_error: state.last_error.as_ref().map(ToString::to_string),
            failure_rate: state.stats.failure_rate(),
            stats: state.stats.clone(),
        }
    }

    // == Shutdown ==
    /// Stops the timer and closes the cache.
    ///
    /// The current snapshot stays readable. Fetches still running are left
    /// to finish and their results are discarded.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
        self.inner.state().closed = true;
        self.inner.settled.send_modify(|epoch| *epoch += 1);
        debug!(cache = %self.inner.name, "cache shut down");
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// Fetcher returning a scripted sequence of results, optionally gated.
    struct Scripted {
        calls: Arc<AtomicUsize>,
        results: Mutex<Vec<Result<u32, FetchError>>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl Scripted {
        fn new(results: Vec<Result<u32, FetchError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fetcher = Self {
                calls: Arc::clone(&calls),
                results: Mutex::new(results.into_iter().rev().collect()),
                gate: None,
            };
            (fetcher, calls)
        }

        fn gated(mut self, gate: Arc<Semaphore>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl Fetch<u32> for Scripted {
        async fn fetch(&self) -> Result<u32, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(FetchError::Store("script exhausted".into())))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Fetch<u32> for Panicking {
        async fn fetch(&self) -> Result<u32, FetchError> {
            panic!("fetcher blew up");
        }
    }

    async fn wait_for_calls(calls: &AtomicUsize, expected: usize) {
        while calls.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_cold_get_config_fetches_once() {
        let (fetcher, calls) = Scripted::new(vec![Ok(7)]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());

        assert!(cache.snapshot().is_none());
        assert_eq!(*cache.get_config().await.unwrap(), 7);
        assert_eq!(*cache.get_config().await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cold_get_config_propagates_initial_failure() {
        let (fetcher, _) = Scripted::new(vec![Err(FetchError::Store("down".into()))]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());

        let err = cache.get_config().await.unwrap_err();
        assert_eq!(err, FetchError::Store("down".into()));
        assert!(cache.snapshot().is_none());
        assert!(!cache.status().ready);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_skipped() {
        let gate = Arc::new(Semaphore::new(0));
        let (fetcher, calls) = Scripted::new(vec![Ok(1), Ok(2)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher.gated(Arc::clone(&gate)),
            CacheOptions::manual(),
        );

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await }
        });
        wait_for_calls(&calls, 1).await;

        assert!(matches!(cache.refresh().await, Refresh::Skipped));
        gate.add_permits(1);

        assert!(matches!(first.await.unwrap(), Refresh::Installed(v) if *v == 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.status().stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_cold_waiters_share_in_flight_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let (fetcher, calls) = Scripted::new(vec![Ok(5)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher.gated(Arc::clone(&gate)),
            CacheOptions::manual(),
        );

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_config().await })
            })
            .collect();
        wait_for_calls(&calls, 1).await;
        gate.add_permits(1);

        for waiter in waiters {
            assert_eq!(*waiter.await.unwrap().unwrap(), 5);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_snapshot() {
        let (fetcher, _) = Scripted::new(vec![Ok(1), Err(FetchError::Store("down".into()))]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());
        let seen = Arc::new(Mutex::new(Vec::new()));
        cache.on_fetch_error({
            let seen = Arc::clone(&seen);
            move |name, err| seen.lock().unwrap().push((name.to_string(), err.clone()))
        });

        assert_eq!(*cache.get_config().await.unwrap(), 1);
        assert!(matches!(cache.refresh().await, Refresh::Failed(_)));

        assert_eq!(*cache.get_config().await.unwrap(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("numbers".to_string(), FetchError::Store("down".into()))]
        );
        assert!(cache.last_error().is_some());
    }

    #[tokio::test]
    async fn test_success_clears_last_error() {
        let (fetcher, _) = Scripted::new(vec![Err(FetchError::Store("down".into())), Ok(3)]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());

        assert!(cache.get_config().await.is_err());
        assert_eq!(cache.status().last_error.as_deref(), Some("store read failed: down"));

        assert_eq!(*cache.get_config().await.unwrap(), 3);
        assert!(cache.last_error().is_none());
        let stats = cache.status().stats;
        assert_eq!(stats.refreshes, 1);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_block_others() {
        let (fetcher, _) = Scripted::new(vec![Err(FetchError::Store("down".into()))]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());
        let calls = Arc::new(AtomicUsize::new(0));
        cache.on_fetch_error(|_, _| panic!("sink failure"));
        cache.on_fetch_error({
            let calls = Arc::clone(&calls);
            move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(matches!(cache.refresh().await, Refresh::Failed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.status().in_flight);
    }

    #[tokio::test]
    async fn test_panicking_fetch_clears_in_flight() {
        let cache = SnapshotCache::new("numbers", Panicking, CacheOptions::manual());

        let err = cache.get_config().await.unwrap_err();
        assert_eq!(err, FetchError::Interrupted);
        assert!(!cache.status().in_flight);
        assert_eq!(cache.last_error(), Some(FetchError::Interrupted));
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_abandon_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let (fetcher, calls) = Scripted::new(vec![Ok(9)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher.gated(Arc::clone(&gate)),
            CacheOptions::manual(),
        );

        let caller = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_config().await }
        });
        wait_for_calls(&calls, 1).await;
        caller.abort();
        gate.add_permits(1);

        assert_eq!(*cache.get_config().await.unwrap(), 9);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_discards_late_result() {
        let gate = Arc::new(Semaphore::new(0));
        let (fetcher, calls) = Scripted::new(vec![Ok(4)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher.gated(Arc::clone(&gate)),
            CacheOptions::manual(),
        );

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await }
        });
        wait_for_calls(&calls, 1).await;
        cache.shutdown();
        gate.add_permits(1);

        assert!(matches!(
            pending.await.unwrap(),
            Refresh::Failed(FetchError::Closed)
        ));
        assert!(cache.snapshot().is_none());
        assert_eq!(cache.get_config().await.unwrap_err(), FetchError::Closed);
        assert!(matches!(cache.refresh().await, Refresh::Skipped));
    }

    #[tokio::test]
    async fn test_shutdown_wakes_cold_waiter_with_closed() {
        let gate = Arc::new(Semaphore::new(1));
        let (fetcher, calls) = Scripted::new(vec![Err(FetchError::Store("old".into())), Ok(2)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher.gated(Arc::clone(&gate)),
            CacheOptions::manual(),
        );
        assert_eq!(
            cache.get_config().await.unwrap_err(),
            FetchError::Store("old".into())
        );

        let pending = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await }
        });
        wait_for_calls(&calls, 2).await;
        let waiter = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_config().await }
        });
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        cache.shutdown();
        assert_eq!(waiter.await.unwrap().unwrap_err(), FetchError::Closed);

        gate.add_permits(1);
        assert!(matches!(
            pending.await.unwrap(),
            Refresh::Failed(FetchError::Closed)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_start_timer() {
        let (fetcher, calls) = Scripted::new(vec![Ok(1)]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::new(Duration::ZERO, true));

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(lock(&cache.inner.timer).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*cache.get_config().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_reports_failure_rate() {
        let (fetcher, _) = Scripted::new(vec![Err(FetchError::Store("down".into())), Ok(3)]);
        let cache = SnapshotCache::new("numbers", fetcher, CacheOptions::manual());

        assert!(cache.get_config().await.is_err());
        assert_eq!(cache.status().failure_rate, 1.0);
        assert_eq!(*cache.get_config().await.unwrap(), 3);
        assert_eq!(cache.status().failure_rate, 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_replaces_snapshot() {
        let (fetcher, calls) = Scripted::new(vec![Ok(1), Ok(2)]);
        let cache = SnapshotCache::new(
            "numbers",
            fetcher,
            CacheOptions::new(Duration::from_secs(60), true),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0, "first population is lazy");
        assert_eq!(*cache.get_config().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        wait_for_calls(&calls, 2).await;
        while cache.status().in_flight {
            tokio::task::yield_now().await;
        }
        assert_eq!(*cache.get_config().await.unwrap(), 2);
        cache.shutdown();
    }
}
