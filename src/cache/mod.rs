//! Cache Module
//!
//! Provides self-refreshing snapshot caches: one immutable value per cache,
//! replaced wholesale by a configured fetch function.

mod snapshot;
mod stats;


// Re-export public types
pub use snapshot::{CacheOptions, CacheStatus, ErrorHandler, Fetch, Refresh, SnapshotCache};
pub use stats::RefreshStats;
