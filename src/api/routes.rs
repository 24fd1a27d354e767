//! API Routes
//!
//! Configures the Axum router with all catalog endpoints, mounted under `/api`.

use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{
    actors_handler, categories_handler, countries_handler, directors_handler, genres_handler,
    max_handler, movie_handler, movies_handler, polls_handler, search_actors_handler,
    search_directors_handler, search_polls_handler, status_handler, update_movie_handler,
    AppState,
};

fn allowed_origin(origin: Option<&str>) -> AllowOrigin {
    match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(_)) => {
            warn!(origin = ?origin, "invalid CORS origin, allowing any origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    }
}

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: the configured origin, or any origin when none is set
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(state.cors_origin.as_deref()))
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/status", get(status_handler))
        .route("/movies", get(movies_handler))
        .route("/movies/max/:property", get(max_handler))
        .route("/movies/:id", get(movie_handler).put(update_movie_handler))
        .route("/directors", get(directors_handler))
        .route("/directors/search", get(search_directors_handler))
        .route("/actors", get(actors_handler))
        .route("/actors/search", get(search_actors_handler))
        .route("/polls", get(polls_handler))
        .route("/polls/search", get(search_polls_handler))
        .route("/categories", get(categories_handler))
        .route("/countries", get(countries_handler))
        .route("/genres", get(genres_handler));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
