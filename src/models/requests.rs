//! Request DTOs for the catalog API
//!
//! Query-string and body shapes of incoming requests.

use serde::Deserialize;

use crate::catalog::{AggregateKind, Movie};
use crate::error::Result;
use crate::query::{
    compare, date_range, equals, exists, is_in, sort, FilterSpec, InMode, RangeOrder,
    SortDirection, SortSpec,
};

/// Default sort field of the movie listing.
pub const DEFAULT_SORT_FIELD: &str = "tmdb.popularity";

/// Which genre taxonomy a genre filter or listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenresSource {
    #[default]
    Senscritique,
    Tmdb,
}

impl GenresSource {
    pub fn field(self) -> &'static str {
        match self {
            GenresSource::Senscritique => "senscritique.genresInfos",
            GenresSource::Tmdb => "tmdb.genres",
        }
    }
}

/// Query-string flags are true only when spelled "true", in any case.
fn flag(raw: &Option<String>) -> Option<bool> {
    raw.as_deref().map(|v| v.eq_ignore_ascii_case("true"))
}

/// Query parameters of GET /movies
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviesQuery {
    pub actors: Option<String>,
    pub categories: Option<String>,
    pub countries: Option<String>,
    pub date_release: Option<String>,
    pub date_release_order: Option<RangeOrder>,
    pub directors: Option<String>,
    pub duration: Option<String>,
    pub duration_order: Option<RangeOrder>,
    pub genres: Option<String>,
    pub genres_source: Option<GenresSource>,
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
    pub polls: Option<String>,
    pub popularity: Option<String>,
    pub popularity_order: Option<RangeOrder>,
    pub providers: Option<String>,
    pub random: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub rating_count_order: Option<RangeOrder>,
    pub rating_order: Option<RangeOrder>,
    pub released: Option<String>,
    pub sort_order: Option<SortDirection>,
    pub sort_value: Option<String>,
}

impl MoviesQuery {
    /// Compiles every supplied parameter into one conjunctive filter.
    pub fn to_filter(&self) -> Result<FilterSpec> {
        let text = |field: &str, raw: &Option<String>| is_in(field, raw.as_deref(), InMode::Text);
        let range = |field: &str, raw: &Option<String>, order: Option<RangeOrder>| {
            compare(field, raw.as_deref(), order.unwrap_or_default())
        };

        let date_order = self.date_release_order.unwrap_or_default();
        let dates = date_range(self.date_release.as_deref(), date_order)?;
        let genres_field = self.genres_source.unwrap_or_default().field();

        Ok(FilterSpec::new()
            .and(text(AggregateKind::Director.id_path(), &self.directors)?)
            .and(text(AggregateKind::Actor.id_path(), &self.actors)?)
            .and(text(AggregateKind::Poll.id_path(), &self.polls)?)
            .and(text("senscritique.category", &self.categories)?)
            .and(text("senscritique.countries", &self.countries)?)
            .and(text(genres_field, &self.genres)?)
            .and(compare("senscritique.dateRelease", dates.as_deref(), date_order)?)
            .and(range("senscritique.rating", &self.rating, self.rating_order)?)
            .and(range(
                "senscritique.stats.ratingCount",
                &self.rating_count,
                self.rating_count_order,
            )?)
            .and(range("tmdb.popularity", &self.popularity, self.popularity_order)?)
            .and(range("senscritique.duration", &self.duration, self.duration_order)?)
            .and(exists("providers.0", flag(&self.providers)))
            .and(equals("released", flag(&self.released))))
    }

    pub fn to_sort(&self) -> Option<SortSpec> {
        let field = self.sort_value.as_deref().unwrap_or(DEFAULT_SORT_FIELD);
        sort(Some(field), self.sort_order)
    }

    pub fn is_random(&self) -> bool {
        flag(&self.random).unwrap_or(false)
    }
}

/// Query parameters of the aggregate list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_size: Option<usize>,
}

/// Query parameters of the aggregate search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub search: String,
}

/// Query parameters of GET /genres
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenresQuery {
    pub source: Option<GenresSource>,
}

/// Request body for PUT /movies/:id
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMovieRequest {
    pub movie: Movie,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Condition, RangeOp};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_empty_query_compiles_to_empty_filter() {
        let query = MoviesQuery::default();
        assert!(query.to_filter().unwrap().is_empty());
        assert!(!query.is_random());
    }

    #[test]
    fn test_movies_query_filters() {
        let query = MoviesQuery {
            directors: Some("d1,d2".into()),
            genres: Some("Drame".into()),
            genres_source: Some(GenresSource::Tmdb),
            date_release: Some("1990,1999".into()),
            date_release_order: Some(RangeOrder::Between),
            providers: Some("TRUE".into()),
            released: Some("false".into()),
            ..MoviesQuery::default()
        };

        let filter = query.to_filter().unwrap();
        assert_eq!(
            filter.get("senscritique.directors._id"),
            Some(&Condition::In(vec![json!("d1"), json!("d2")]))
        );
        assert_eq!(
            filter.get("tmdb.genres"),
            Some(&Condition::In(vec![json!("Drame")]))
        );
        assert_eq!(
            filter.get("senscritique.dateRelease"),
            Some(&Condition::Range(BTreeMap::from([
                (RangeOp::Gte, json!("1990-01-01")),
                (RangeOp::Lte, json!("1999-12-31")),
            ])))
        );
        assert_eq!(filter.get("providers.0"), Some(&Condition::Exists(true)));
        assert_eq!(filter.get("released"), Some(&Condition::Equals(json!(false))));
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let query = MoviesQuery {
            rating: Some("5".into()),
            rating_order: Some(RangeOrder::Between),
            ..MoviesQuery::default()
        };
        assert!(query.to_filter().is_err());
    }

    #[test]
    fn test_sort_defaults_to_popularity() {
        let sort = MoviesQuery::default().to_sort().unwrap();
        assert_eq!(sort.field, DEFAULT_SORT_FIELD);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_update_request_deserialize() {
        let body = r#"{"movie": {"id": 3, "senscritique": {"rating": 7}}}"#;
        let req: UpdateMovieRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.movie.id, 3);
        assert_eq!(req.movie.rating(), 7.0);
    }
}
