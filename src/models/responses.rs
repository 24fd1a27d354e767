//! Response DTOs for the catalog API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStatus;
use crate::catalog::{AggregateEntity, Movie};

/// Response body for GET /movies
#[derive(Debug, Clone, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<Movie>,
    /// Number of movies matching the filter, across all pages
    pub total: u64,
}

/// Response body for GET /movies/:id
#[derive(Debug, Clone, Serialize)]
pub struct MovieResponse {
    pub movie: Movie,
}

/// Response body for PUT /movies/:id
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub id: i64,
}

impl UpdateResponse {
    pub fn new(id: i64) -> Self {
        Self {
            message: format!("Movie '{}' updated successfully", id),
            id,
        }
    }
}

/// Response body for GET /movies/max/:property
#[derive(Debug, Clone, Serialize)]
pub struct MaxResponse {
    /// Largest value of the property, or null when no movie carries it
    pub max: Option<Value>,
}

/// A single list keyed by its resource name, e.g. `{"directors": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct NamedList<T> {
    #[serde(flatten)]
    lists: BTreeMap<&'static str, Vec<T>>,
}

impl<T> NamedList<T> {
    pub fn new(name: &'static str, items: Vec<T>) -> Self {
        Self {
            lists: BTreeMap::from([(name, items)]),
        }
    }
}

/// Response body for the aggregate search endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub list: Vec<AggregateEntity>,
}

/// Response body for the status endpoint (GET /status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// "healthy" once every cache holds a snapshot, "starting" before
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub caches: Vec<CacheStatus>,
}

impl StatusResponse {
    pub fn from_caches(caches: Vec<CacheStatus>) -> Self {
        let status = if caches.iter().all(|c| c.ready) {
            "healthy"
        } else {
            "starting"
        };
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            caches,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
