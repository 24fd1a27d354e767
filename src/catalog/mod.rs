//! Catalog Module
//!
//! Movie documents, the caches built on them, and the aggregate lists
//! derived from the movie snapshot.

mod aggregate;
mod fetch;
mod movie;
mod registry;
mod search;


pub use aggregate::{reduce, ranking, AggregateEntity, AggregateKind, Extractor};
pub use fetch::{AggregateFetcher, MovieFetcher};
pub use movie::{Association, CastMember, Movie, RatingStats, SensCritique, Tmdb};
pub use registry::{AggregateList, CatalogCaches, MovieList};
pub use search::rank_by_name;
