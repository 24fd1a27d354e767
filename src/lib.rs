//! Movie Catalog - A read-mostly movie catalog API
//!
//! Serves movie queries from a document store and director, actor and poll
//! rankings from self-refreshing snapshot caches.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheOptions, SnapshotCache};
pub use catalog::CatalogCaches;
pub use config::Config;
pub use tasks::spawn_refresh_task;
