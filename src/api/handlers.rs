//! API Handlers
//!
//! HTTP request handlers for each catalog endpoint. Aggregate lists are
//! served from the snapshot caches; movie queries go to the store.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rand::Rng;
use serde_json::Value;

use crate::catalog::{rank_by_name, AggregateEntity, AggregateKind, CatalogCaches};
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::models::{
    GenresQuery, MaxResponse, MovieResponse, MoviesQuery, MoviesResponse, NamedList,
    PageQuery, SearchQuery, SearchResponse, StatusResponse, UpdateMovieRequest,
    UpdateResponse,
};
use crate::query::{exists, sort, FilterSpec, SortDirection};
use crate::store::{candidates, MovieStore};

/// Number of entities returned by the search endpoints.
const SEARCH_LIMIT: usize = 10;

/// Properties accepted by GET /movies/max/:property
const MAX_PROPERTIES: [&str; 2] = ["tmdb.popularity", "senscritique.stats.ratingCount"];

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub caches: CatalogCaches,
    pub store: Arc<dyn MovieStore>,
    /// Default page size of GET /movies
    pub page_size: usize,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl AppState {
    pub fn new(caches: CatalogCaches, store: Arc<dyn MovieStore>) -> Self {
        let defaults = Config::default();
        Self {
            caches,
            store,
            page_size: defaults.page_size,
            cors_origin: defaults.cors_origin,
        }
    }

    pub fn from_config(config: &Config, caches: CatalogCaches, store: Arc<dyn MovieStore>) -> Self {
        Self {
            caches,
            store,
            page_size: config.page_size,
            cors_origin: config.cors_origin.clone(),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| CatalogError::InvalidParameter(format!("Invalid Id `{}`", raw)))
}

/// Non-empty strings among distinct store values, sorted.
fn string_values(values: Vec<Value>) -> Vec<String> {
    let mut strings: Vec<String> = values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
        .collect();
    strings.sort();
    strings
}

/// Handler for GET /status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::from_caches(state.caches.statuses()))
}

// == Movies ==
/// Handler for GET /movies
///
/// Filters, sorts and pages the movie collection. With `random=true` a
/// single matching movie is picked at random instead of a page.
pub async fn movies_handler(
    State(state): State<AppState>,
    Query(params): Query<MoviesQuery>,
) -> Result<Json<MoviesResponse>> {
    let filter = params.to_filter()?;
    let total = state.store.count(&filter).await?;

    let page_index = params.page_index.unwrap_or(0);
    let page_size = params.page_size.unwrap_or(state.page_size);
    if page_index.saturating_mul(page_size) as u64 > total {
        return Ok(Json(MoviesResponse {
            movies: Vec::new(),
            total,
        }));
    }

    let sort = params.to_sort();
    let (skip, limit) = if params.is_random() {
        let pick = if total == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..total)
        };
        (pick as usize, 1)
    } else {
        (page_index * page_size, page_size)
    };

    let movies = state
        .store
        .find(&filter, sort.as_ref(), skip, limit)
        .await?;
    Ok(Json(MoviesResponse { movies, total }))
}

/// Handler for GET /movies/:id
pub async fn movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MovieResponse>> {
    let id = parse_id(&id)?;
    let movie = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("movie {}", id)))?;
    Ok(Json(MovieResponse { movie }))
}

/// Handler for PUT /movies/:id
///
/// Replaces the stored document. Caches pick the change up on their next
/// refresh.
pub async fn update_movie_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMovieRequest>,
) -> Result<Json<UpdateResponse>> {
    let id = parse_id(&id)?;
    if !state.store.update_by_id(id, req.movie).await? {
        return Err(CatalogError::NotFound(format!("movie {}", id)));
    }
    Ok(Json(UpdateResponse::new(id)))
}

/// Handler for GET /movies/max/:property
pub async fn max_handler(
    State(state): State<AppState>,
    Path(property): Path<String>,
) -> Result<Json<MaxResponse>> {
    if !MAX_PROPERTIES.contains(&property.as_str()) {
        return Err(CatalogError::InvalidParameter(format!(
            "unsupported property `{}`",
            property
        )));
    }

    let filter = FilterSpec::new().and(exists(&property, Some(true)));
    let order = sort(Some(property.as_str()), Some(SortDirection::Desc));
    let top = state.store.find(&filter, order.as_ref(), 0, 1).await?;

    let doc = top.first().map(|movie| movie.to_document());
    let max = doc
        .as_ref()
        .and_then(|doc| candidates(doc, &property).into_iter().next().cloned());
    Ok(Json(MaxResponse { max }))
}

// == Aggregates ==
/// First `pageSize` entities of an aggregate snapshot, ordered by name.
async fn list_aggregate(
    state: &AppState,
    kind: AggregateKind,
    params: PageQuery,
) -> Result<Json<NamedList<AggregateEntity>>> {
    let entities = state.caches.aggregate(kind).get_config().await?;
    let page_size = params.page_size.unwrap_or_else(|| kind.default_page_size());

    let mut page: Vec<AggregateEntity> = entities.iter().take(page_size).cloned().collect();
    page.sort_by_cached_key(|entity| entity.name.to_lowercase());
    Ok(Json(NamedList::new(kind.name(), page)))
}

async fn search_aggregate(
    state: &AppState,
    kind: AggregateKind,
    params: SearchQuery,
) -> Result<Json<SearchResponse>> {
    let entities = state.caches.aggregate(kind).get_config().await?;
    Ok(Json(SearchResponse {
        list: rank_by_name(&entities, &params.search, SEARCH_LIMIT),
    }))
}

/// Handler for GET /directors
pub async fn directors_handler(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<NamedList<AggregateEntity>>> {
    list_aggregate(&state, AggregateKind::Director, params).await
}

/// Handler for GET /actors
pub async fn actors_handler(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<NamedList<AggregateEntity>>> {
    list_aggregate(&state, AggregateKind::Actor, params).await
}

/// Handler for GET /polls
pub async fn polls_handler(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<NamedList<AggregateEntity>>> {
    list_aggregate(&state, AggregateKind::Poll, params).await
}

pub async fn search_directors_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    search_aggregate(&state, AggregateKind::Director, params).await
}

pub async fn search_actors_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    search_aggregate(&state, AggregateKind::Actor, params).await
}

pub async fn search_polls_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    search_aggregate(&state, AggregateKind::Poll, params).await
}

// == Distinct Values ==
/// Handler for GET /categories
pub async fn categories_handler(
    State(state): State<AppState>,
) -> Result<Json<NamedList<String>>> {
    let values = state
        .store
        .distinct("senscritique.category", &FilterSpec::new())
        .await?;
    Ok(Json(NamedList::new("categories", string_values(values))))
}

/// Handler for GET /countries
pub async fn countries_handler(
    State(state): State<AppState>,
) -> Result<Json<NamedList<String>>> {
    let values = state
        .store
        .distinct("senscritique.countries", &FilterSpec::new())
        .await?;
    Ok(Json(NamedList::new("countries", string_values(values))))
}

/// Handler for GET /genres
pub async fn genres_handler(
    State(state): State<AppState>,
    Query(params): Query<GenresQuery>,
) -> Result<Json<NamedList<String>>> {
    let field = params.source.unwrap_or_default().field();
    let values = state.store.distinct(field, &FilterSpec::new()).await?;
    Ok(Json(NamedList::new("genres", string_values(values))))
}
