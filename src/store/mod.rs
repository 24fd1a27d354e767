//! Store Module
//!
//! Boundary to the document store holding movie documents.

mod document;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::Movie;
use crate::error::StoreError;
use crate::query::{FilterSpec, SortSpec};

pub use document::{candidates, compare_values, matches, resolve, values_equal};
pub use memory::MemoryStore;

/// Operations the catalog needs from the document store.
///
/// Only `all_movies` is used by the caches; the remaining operations serve
/// the API layer.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Reads the whole movie collection in one operation.
    async fn all_movies(&self) -> Result<Vec<Movie>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Movie>, StoreError>;

    /// Replaces the document with the given id. Returns false if none exists.
    async fn update_by_id(&self, id: i64, movie: Movie) -> Result<bool, StoreError>;

    /// Distinct non-null values at `field` among matching documents.
    async fn distinct(&self, field: &str, filter: &FilterSpec) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError>;

    async fn find(
        &self,
        filter: &FilterSpec,
        sort: Option<&SortSpec>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Movie>, StoreError>;
}
