//! API Module
//!
//! HTTP handlers and routing for the catalog REST API.
//!
//! # Endpoints
//! - `GET /api/status` - Cache readiness and refresh statistics
//! - `GET /api/movies` - Filtered, sorted, paged movie listing
//! - `GET|PUT /api/movies/:id` - Read or replace one movie
//! - `GET /api/movies/max/:property` - Largest value of a numeric property
//! - `GET /api/{directors,actors,polls}` - Aggregate lists
//! - `GET /api/{directors,actors,polls}/search` - Aggregate name search
//! - `GET /api/{categories,countries,genres}` - Distinct values

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
