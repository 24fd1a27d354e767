//! Aggregate entities derived from the movie snapshot.
//!
//! Directors, actors and polls are never stored on their own. Each is
//! rebuilt by scanning every movie once and keeping, per entity, the best
//! rating and the largest rating count among the movies it appears in.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::movie::{Association, Movie};

/// Pulls the associated entities of one kind out of a movie.
///
/// `None` marks an entry whose wrapper is malformed (an actor slot with no
/// actor); the reduction skips it.
pub type Extractor = for<'a> fn(&'a Movie) -> Vec<Option<&'a Association>>;

// == Aggregate Entity ==
/// Entity with running maxima over the movies it is associated with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub max_rating: f64,
    pub max_rating_count: u64,
}

/// Output ordering: most rated first, then best rated, then id.
pub fn ranking(a: &AggregateEntity, b: &AggregateEntity) -> Ordering {
    b.max_rating_count
        .cmp(&a.max_rating_count)
        .then_with(|| b.max_rating.total_cmp(&a.max_rating))
        .then_with(|| a.id.cmp(&b.id))
}

// == Aggregate Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Actor,
    Director,
    Poll,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 3] = [
        AggregateKind::Actor,
        AggregateKind::Director,
        AggregateKind::Poll,
    ];

    /// Cache name, also the JSON key of list responses.
    pub fn name(self) -> &'static str {
        match self {
            AggregateKind::Actor => "actors",
            AggregateKind::Director => "directors",
            AggregateKind::Poll => "polls",
        }
    }

    pub fn extractor(self) -> Extractor {
        match self {
            AggregateKind::Actor => actors_of,
            AggregateKind::Director => directors_of,
            AggregateKind::Poll => polls_of,
        }
    }

    /// Movie field path holding this kind's ids, for movie filters.
    pub fn id_path(self) -> &'static str {
        match self {
            AggregateKind::Actor => "senscritique.actors.actor._id",
            AggregateKind::Director => "senscritique.directors._id",
            AggregateKind::Poll => "senscritique.polls._id",
        }
    }

    /// Default number of entries returned by the list endpoint.
    pub fn default_page_size(self) -> usize {
        match self {
            AggregateKind::Actor | AggregateKind::Director => 500,
            AggregateKind::Poll => 50,
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn directors_of(movie: &Movie) -> Vec<Option<&Association>> {
    movie.senscritique.directors.iter().map(Some).collect()
}

fn actors_of(movie: &Movie) -> Vec<Option<&Association>> {
    movie
        .senscritique
        .actors
        .iter()
        .map(|member| member.actor.as_ref())
        .collect()
}

fn polls_of(movie: &Movie) -> Vec<Option<&Association>> {
    movie
        .senscritique
        .polls
        .iter()
        .flatten()
        .map(Some)
        .collect()
}

// == Reduction ==
struct Running<'a> {
    name: &'a str,
    max_rating: f64,
    max_rating_count: u64,
}

/// Folds movies into one entry per associated entity id, sorted by `ranking`.
///
/// Entries without an id are skipped. The name kept for an entity is the
/// first one encountered.
pub fn reduce(movies: &[Movie], extract: Extractor) -> Vec<AggregateEntity> {
    let mut running: HashMap<&str, Running<'_>> = HashMap::new();
    let mut skipped = 0usize;

    for movie in movies {
        let rating = movie.rating();
        let rating_count = movie.rating_count();

        for association in extract(movie) {
            let Some((id, name)) = association.and_then(|a| {
                a.id.as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| (id, a.name.as_str()))
            }) else {
                skipped += 1;
                continue;
            };

            running
                .entry(id)
                .and_modify(|entry| {
                    entry.max_rating = entry.max_rating.max(rating);
                    entry.max_rating_count = entry.max_rating_count.max(rating_count);
                })
                .or_insert(Running {
                    name,
                    max_rating: rating,
                    max_rating_count: rating_count,
                });
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped association entries without id");
    }

    let mut entities: Vec<AggregateEntity> = running
        .into_iter()
        .map(|(id, entry)| AggregateEntity {
            id: id.to_string(),
            name: entry.name.to_string(),
            max_rating: entry.max_rating,
            max_rating_count: entry.max_rating_count,
        })
        .collect();
    entities.sort_by(ranking);
    entities
}
