//! Request and Response models for the catalog API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{
    GenresQuery, GenresSource, MoviesQuery, PageQuery, SearchQuery, UpdateMovieRequest,
    DEFAULT_SORT_FIELD,
};
pub use responses::{
    ErrorResponse, MaxResponse, MovieResponse, MoviesResponse, NamedList, SearchResponse,
    StatusResponse, UpdateResponse,
};
