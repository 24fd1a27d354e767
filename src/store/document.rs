//! Path lookup and condition matching over JSON documents.

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{Condition, FilterSpec, RangeOp};

/// Values reached by following a dotted path.
///
/// Arrays met along the way fan out over their elements, and a numeric
/// segment indexes into an array.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(segment)),
                Value::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(
                        items
                            .iter()
                            .filter_map(|item| item.as_object())
                            .filter_map(|map| map.get(segment)),
                    ),
                },
                _ => {}
            }
        }
        current = next;
    }
    current
}

/// Leaf values a condition is tested against; arrays contribute their elements.
pub fn candidates<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    resolve(doc, path)
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

/// Equality treating integer and float representations of a number alike.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Orders numbers, strings and booleans among themselves; other pairs are incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn satisfies(doc: &Value, field: &str, condition: &Condition) -> bool {
    let found = candidates(doc, field);
    let any_listed = |values: &[Value]| {
        found
            .iter()
            .any(|c| values.iter().any(|v| values_equal(c, v)))
    };

    match condition {
        Condition::In(values) => any_listed(values),
        Condition::NotIn(values) => !any_listed(values),
        Condition::Exists(flag) => !resolve(doc, field).is_empty() == *flag,
        Condition::Equals(value) => found.iter().any(|c| values_equal(c, value)),
        Condition::Range(bounds) => bounds.iter().all(|(op, bound)| {
            found.iter().any(|c| match (op, compare_values(c, bound)) {
                (RangeOp::Gte, Some(order)) => order != Ordering::Less,
                (RangeOp::Lte, Some(order)) => order != Ordering::Greater,
                (_, None) => false,
            })
        }),
    }
}

/// Whether a document satisfies every condition of the spec.
pub fn matches(doc: &Value, filter: &FilterSpec) -> bool {
    filter
        .iter()
        .all(|(field, condition)| satisfies(doc, field, condition))
}
