//! Error types for the catalog service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error ==
/// Failure of a cache fetch.
///
/// Cloned into every waiter of a cold-start fetch and into every error
/// handler, so it only carries owned, clonable data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The store collaborator failed
    #[error("store read failed: {0}")]
    Store(String),

    /// An upstream cache could not provide its snapshot
    #[error("dependency `{cache}` unavailable: {source}")]
    Dependency {
        cache: String,
        #[source]
        source: Box<FetchError>,
    },

    /// The fetch task ended without producing a result
    #[error("fetch interrupted before completion")]
    Interrupted,

    /// The cache has been shut down
    #[error("cache is shut down")]
    Closed,
}

impl FetchError {
    /// Wraps an upstream cache failure without hiding the original cause.
    pub fn dependency(cache: impl Into<String>, source: FetchError) -> Self {
        FetchError::Dependency {
            cache: cache.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error of a dependency chain.
    pub fn root_cause(&self) -> &FetchError {
        match self {
            FetchError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

// == Store Error ==
/// Errors raised by the document store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file could not be read
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Documents could not be decoded or encoded
    #[error("store decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<StoreError> for FetchError {
    fn from(err: StoreError) -> Self {
        FetchError::Store(err.to_string())
    }
}

// == Catalog Error Enum ==
/// Request-level error for the catalog API.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed query parameter or request body
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Requested document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A cache has no snapshot to serve
    #[error("Data unavailable: {0}")]
    Unavailable(#[from] FetchError),

    /// Store collaborator failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog service.
pub type Result<T> = std::result::Result<T, CatalogError>;
