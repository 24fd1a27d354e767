//! In-memory movie store backed by a JSON document file.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::document::{candidates, compare_values, matches, values_equal};
use super::MovieStore;
use crate::catalog::Movie;
use crate::error::StoreError;
use crate::query::{FilterSpec, SortDirection, SortSpec};

/// Movie documents held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    movies: RwLock<Vec<Movie>>,
}

impl MemoryStore {
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            movies: RwLock::new(movies),
        }
    }

    /// Loads a JSON array of movie documents.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let movies: Vec<Movie> = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded {} movie documents from {}",
            movies.len(),
            path.display()
        );
        Ok(Self::with_movies(movies))
    }

    /// Matching documents paired with their JSON form, in store order.
    async fn select(&self, filter: &FilterSpec) -> Vec<(Movie, Value)> {
        let movies = self.movies.read().await;
        movies
            .iter()
            .map(|movie| (movie, movie.to_document()))
            .filter(|(_, doc)| matches(doc, filter))
            .map(|(movie, doc)| (movie.clone(), doc))
            .collect()
    }
}

/// Missing values sort before present ones, as in ascending document order.
fn sort_key_order(a: &Value, b: &Value, field: &str) -> Ordering {
    let left = candidates(a, field).into_iter().next();
    let right = candidates(b, field).into_iter().next();
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn all_movies(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.movies.read().await.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Movie>, StoreError> {
        let movies = self.movies.read().await;
        Ok(movies.iter().find(|movie| movie.id == id).cloned())
    }

    async fn update_by_id(&self, id: i64, mut movie: Movie) -> Result<bool, StoreError> {
        let mut movies = self.movies.write().await;
        match movies.iter_mut().find(|existing| existing.id == id) {
            Some(existing) => {
                movie.id = id;
                *existing = movie;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn distinct(&self, field: &str, filter: &FilterSpec) -> Result<Vec<Value>, StoreError> {
        let mut values: Vec<Value> = Vec::new();
        for (_, doc) in self.select(filter).await {
            for value in candidates(&doc, field) {
                if !value.is_null() && !values.iter().any(|seen| values_equal(seen, value)) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        Ok(self.select(filter).await.len() as u64)
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        sort: Option<&SortSpec>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Movie>, StoreError> {
        let mut selected = self.select(filter).await;
        if let Some(sort) = sort {
            selected.sort_by(|(_, a), (_, b)| {
                let order = sort_key_order(a, b, &sort.field);
                match sort.direction {
                    SortDirection::Asc => order,
                    SortDirection::Desc => order.reverse(),
                }
            });
        }
        Ok(selected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(movie, _)| movie)
            .collect())
    }
}
