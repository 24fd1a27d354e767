//! Fetch functions behind the catalog caches.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::aggregate::{reduce, AggregateEntity, Extractor};
use super::movie::Movie;
use crate::cache::{Fetch, SnapshotCache};
use crate::error::FetchError;
use crate::store::MovieStore;

/// Bulk-reads the complete movie collection.
pub struct MovieFetcher {
    store: Arc<dyn MovieStore>,
}

impl MovieFetcher {
    pub fn new(store: Arc<dyn MovieStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Fetch<Vec<Movie>> for MovieFetcher {
    async fn fetch(&self) -> Result<Vec<Movie>, FetchError> {
        let movies = self.store.all_movies().await?;
        debug!(count = movies.len(), "fetched movie collection");
        Ok(movies)
    }
}

/// Derives an aggregate list from the movie cache's current snapshot.
pub struct AggregateFetcher {
    movies: SnapshotCache<Vec<Movie>>,
    extract: Extractor,
}

impl AggregateFetcher {
    pub fn new(movies: SnapshotCache<Vec<Movie>>, extract: Extractor) -> Self {
        Self { movies, extract }
    }
}

#[async_trait]
impl Fetch<Vec<AggregateEntity>> for AggregateFetcher {
    async fn fetch(&self) -> Result<Vec<AggregateEntity>, FetchError> {
        let movies = self
            .movies
            .get_config()
            .await
            .map_err(|err| FetchError::dependency(self.movies.name(), err))?;
        Ok(reduce(&movies, self.extract))
    }
}
