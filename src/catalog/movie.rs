//! Movie documents as stored in the catalog.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to an entity embedded in a movie (director, actor, poll).
///
/// The id is optional at the type level so documents with malformed
/// entries still decode; the aggregate reduction skips such entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl Association {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

/// Actor entries are wrapped one level deeper than directors and polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Association>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStats {
    #[serde(default)]
    pub rating_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Critic-site metadata: ratings and the embedded associations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensCritique {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stats: RatingStats,
    #[serde(default)]
    pub directors: Vec<Association>,
    #[serde(default)]
    pub actors: Vec<CastMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polls: Option<Vec<Association>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub countries: Vec<String>,
    #[serde(default)]
    pub genres_infos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tmdb {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A movie document, the base record every aggregate is derived from.
///
/// Fields the service does not interpret are kept in `extra` so that an
/// update through the API round-trips the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub senscritique: SensCritique,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<Tmdb>,
    #[serde(default)]
    pub providers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    /// Creates a bare movie with the given id and rating figures.
    pub fn new(id: i64, rating: Option<f64>, rating_count: u64) -> Self {
        Self {
            id,
            senscritique: SensCritique {
                rating,
                stats: RatingStats {
                    rating_count,
                    ..RatingStats::default()
                },
                ..SensCritique::default()
            },
            tmdb: None,
            providers: Vec::new(),
            released: None,
            extra: Map::new(),
        }
    }

    pub fn with_directors(mut self, directors: Vec<Association>) -> Self {
        self.senscritique.directors = directors;
        self
    }

    pub fn with_actors(mut self, actors: Vec<Association>) -> Self {
        self.senscritique.actors = actors
            .into_iter()
            .map(|actor| CastMember { actor: Some(actor) })
            .collect();
        self
    }

    pub fn with_polls(mut self, polls: Vec<Association>) -> Self {
        self.senscritique.polls = Some(polls);
        self
    }

    /// Rating used by the aggregates; an unrated movie counts as 0.
    pub fn rating(&self) -> f64 {
        self.senscritique.rating.unwrap_or(0.0)
    }

    pub fn rating_count(&self) -> u64 {
        self.senscritique.stats.rating_count
    }

    /// The document as generic JSON, for path-based filtering.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_deserialize_document() {
        let doc = json!({
            "id": 42,
            "title": "Heat",
            "senscritique": {
                "rating": 8.1,
                "stats": { "ratingCount": 1200, "wishCount": 7 },
                "directors": [{ "_id": "d1", "name": "Michael Mann" }],
                "actors": [{ "actor": { "_id": "a1", "name": "Al Pacino" } }],
                "genresInfos": ["Crime"],
                "dateRelease": "1995-12-15"
            },
            "tmdb": { "popularity": 33.5, "genres": ["Crime"] }
        });

        let movie: Movie = serde_json::from_value(doc).unwrap();
        assert_eq!(movie.id, 42);
        assert_eq!(movie.rating(), 8.1);
        assert_eq!(movie.rating_count(), 1200);
        assert_eq!(movie.senscritique.directors[0].id.as_deref(), Some("d1"));
        assert!(movie.senscritique.polls.is_none());
        assert_eq!(movie.extra["title"], "Heat");
        assert!(!movie.senscritique.extra.contains_key("stats"));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let doc = json!({
            "id": 1,
            "title": "Alien",
            "senscritique": {
                "stats": { "ratingCount": 3, "wishCount": 2 },
                "originalTitle": "Alien"
            }
        });
        let movie: Movie = serde_json::from_value(doc).unwrap();
        let back = movie.to_document();
        assert_eq!(back["title"], "Alien");
        assert_eq!(back["senscritique"]["originalTitle"], "Alien");
        assert_eq!(back["senscritique"]["stats"]["ratingCount"], 3);
        assert_eq!(back["senscritique"]["stats"]["wishCount"], 2);
    }

    #[test]
    fn test_association_without_id_decodes() {
        let doc = json!({
            "id": 1,
            "senscritique": { "directors": [{ "name": "Anonymous" }] }
        });
        let movie: Movie = serde_json::from_value(doc).unwrap();
        assert!(movie.senscritique.directors[0].id.is_none());
    }

    #[test]
    fn test_unrated_movie_counts_as_zero() {
        let movie = Movie::new(1, None, 10);
        assert_eq!(movie.rating(), 0.0);
        assert_eq!(movie.rating_count(), 10);
    }
}
