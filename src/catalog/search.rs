//! Name search over aggregate lists.

use super::aggregate::AggregateEntity;

/// How closely a name matches the query; lower is better.
///
/// Names that match in none of the textual tiers still rank, by their edit
/// distance to the query, behind every textual match.
fn score(name: &str, query: &str) -> (u8, usize) {
    if name == query {
        (0, 0)
    } else if name.starts_with(query) {
        (1, 0)
    } else if name.split_whitespace().any(|word| word.starts_with(query)) {
        (2, 0)
    } else if name.contains(query) {
        (3, 0)
    } else if is_subsequence(query, name) {
        (4, 0)
    } else {
        let closest = name
            .split_whitespace()
            .map(|word| edit_distance(word, query))
            .fold(edit_distance(name, query), usize::min);
        (5, closest)
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut rest = haystack.chars();
    needle
        .chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| rest.any(|h| h == c))
}

/// Levenshtein distance over chars, keeping a single row.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// Best `limit` entities for `query`, compared case-insensitively.
///
/// Every entity is a candidate, so a misspelled query still yields the
/// closest names. Entities with the same score keep their list order, so
/// more popular entities win ties.
pub fn rank_by_name(
    entities: &[AggregateEntity],
    query: &str,
    limit: usize,
) -> Vec<AggregateEntity> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<((u8, usize), &AggregateEntity)> = entities
        .iter()
        .map(|entity| (score(&entity.name.to_lowercase(), &query), entity))
        .collect();
    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .take(limit)
        .map(|(_, entity)| entity.clone())
        .collect()
}
