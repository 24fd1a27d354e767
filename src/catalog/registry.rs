//! The set of catalog caches, built once at startup and shared by handle.

use std::sync::Arc;

use tracing::info;

use super::aggregate::{AggregateEntity, AggregateKind};
use super::fetch::{AggregateFetcher, MovieFetcher};
use super::movie::Movie;
use crate::cache::{CacheOptions, CacheStatus, SnapshotCache};
use crate::error::FetchError;
use crate::store::MovieStore;

pub type MovieList = SnapshotCache<Vec<Movie>>;
pub type AggregateList = SnapshotCache<Vec<AggregateEntity>>;

/// Movie cache plus the three aggregate caches derived from it.
///
/// Cloning shares the same caches.
#[derive(Clone)]
pub struct CatalogCaches {
    movies: MovieList,
    actors: AggregateList,
    directors: AggregateList,
    polls: AggregateList,
}

impl CatalogCaches {
    /// Builds all caches with the same scheduling options.
    pub fn new(store: Arc<dyn MovieStore>, options: CacheOptions) -> Self {
        let movies = SnapshotCache::new("movies", MovieFetcher::new(store), options);
        let aggregate = |kind: AggregateKind| {
            SnapshotCache::new(
                kind.name(),
                AggregateFetcher::new(movies.clone(), kind.extractor()),
                options,
            )
        };

        Self {
            actors: aggregate(AggregateKind::Actor),
            directors: aggregate(AggregateKind::Director),
            polls: aggregate(AggregateKind::Poll),
            movies,
        }
    }

    pub fn movies(&self) -> &MovieList {
        &self.movies
    }

    pub fn aggregate(&self, kind: AggregateKind) -> &AggregateList {
        match kind {
            AggregateKind::Actor => &self.actors,
            AggregateKind::Director => &self.directors,
            AggregateKind::Poll => &self.polls,
        }
    }

    /// Registers the same error handler on every cache.
    pub fn on_fetch_error<H>(&self, handler: H)
    where
        H: Fn(&str, &FetchError) + Clone + Send + Sync + 'static,
    {
        self.movies.on_fetch_error(handler.clone());
        for kind in AggregateKind::ALL {
            self.aggregate(kind).on_fetch_error(handler.clone());
        }
    }

    /// Populates every cache, movies first.
    pub async fn warm_up(&self) -> Result<(), FetchError> {
        let movies = self.movies.get_config().await?;
        for kind in AggregateKind::ALL {
            let entities = self.aggregate(kind).get_config().await?;
            info!(cache = kind.name(), count = entities.len(), "aggregate cache ready");
        }
        info!(count = movies.len(), "movie caches initialized");
        Ok(())
    }

    pub fn statuses(&self) -> Vec<CacheStatus> {
        let mut statuses = vec![self.movies.status()];
        statuses.extend(AggregateKind::ALL.iter().map(|kind| self.aggregate(*kind).status()));
        statuses
    }

    /// Stops every refresh timer; current snapshots remain readable.
    pub fn shutdown(&self) {
        self.movies.shutdown();
        for kind in AggregateKind::ALL {
            self.aggregate(kind).shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Association;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    fn store() -> Arc<dyn MovieStore> {
        Arc::new(MemoryStore::with_movies(vec![
            Movie::new(1, Some(8.0), 100)
                .with_directors(vec![Association::new("D1", "Director One")])
                .with_actors(vec![Association::new("A1", "Actor One")]),
            Movie::new(2, Some(6.0), 300)
                .with_directors(vec![Association::new("D1", "Director One")]),
        ]))
    }

    #[tokio::test]
    async fn test_warm_up_populates_every_cache() {
        let caches = CatalogCaches::new(store(), CacheOptions::manual());
        assert!(caches.statuses().iter().all(|s| !s.ready));

        caches.warm_up().await.unwrap();

        assert!(caches.statuses().iter().all(|s| s.ready));
        let directors = caches.aggregate(AggregateKind::Director).snapshot().unwrap();
        assert_eq!(directors[0].max_rating, 8.0);
        assert_eq!(directors[0].max_rating_count, 300);
        assert!(caches.aggregate(AggregateKind::Poll).snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_statuses_names_in_order() {
        let caches = CatalogCaches::new(store(), CacheOptions::manual());
        let names: Vec<_> = caches.statuses().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["movies", "actors", "directors", "polls"]);
    }

    #[tokio::test]
    async fn test_aggregate_refresh_shares_base_fetch() {
        let caches = CatalogCaches::new(store(), CacheOptions::manual());
        caches.warm_up().await.unwrap();
        caches.aggregate(AggregateKind::Actor).refresh().await;

        assert_eq!(caches.movies().status().stats.refreshes, 1);
        assert_eq!(
            caches.aggregate(AggregateKind::Actor).status().stats.refreshes,
            2
        );
    }

    #[tokio::test]
    async fn test_shutdown_keeps_snapshots_readable() {
        let caches = CatalogCaches::new(store(), CacheOptions::manual());
        caches.warm_up().await.unwrap();
        caches.shutdown();

        assert!(caches.movies().get_config().await.is_ok());
        let seen = Arc::new(Mutex::new(0));
        caches.on_fetch_error({
            let seen = Arc::clone(&seen);
            move |_, _| *seen.lock().unwrap() += 1
        });
        caches.movies().refresh().await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }
}
