//! Filter compiler
//!
//! Turns raw query-string values into field conditions. Each function
//! contributes at most one condition; callers AND them together with
//! `FilterSpec::and`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{CatalogError, Result};

// == Operators ==
/// Comparison operator of a range condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeOp {
    Gte,
    Lte,
}

/// Which bounds a comma list of range values supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RangeOrder {
    #[default]
    #[serde(rename = "gte")]
    Gte,
    #[serde(rename = "lte")]
    Lte,
    /// Closed range: first value is the lower bound, second the upper
    #[serde(rename = "gte,lte")]
    Between,
}

impl RangeOrder {
    /// Operators in the positional order values are applied to them.
    pub fn operators(self) -> &'static [RangeOp] {
        match self {
            RangeOrder::Gte => &[RangeOp::Gte],
            RangeOrder::Lte => &[RangeOp::Lte],
            RangeOrder::Between => &[RangeOp::Gte, RangeOp::Lte],
        }
    }
}

impl fmt::Display for RangeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RangeOrder::Gte => "gte",
            RangeOrder::Lte => "lte",
            RangeOrder::Between => "gte,lte",
        };
        f.write_str(text)
    }
}

impl FromStr for RangeOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gte" => Ok(RangeOrder::Gte),
            "lte" => Ok(RangeOrder::Lte),
            "gte,lte" => Ok(RangeOrder::Between),
            other => Err(CatalogError::InvalidParameter(format!(
                "unknown range order `{}`",
                other
            ))),
        }
    }
}

// == Conditions ==
/// Constraint on a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Exists(bool),
    Range(BTreeMap<RangeOp, Value>),
    Equals(Value),
}

/// A condition bound to a dotted field path.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub condition: Condition,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }
}

// == Filter Spec ==
/// Conjunction of field conditions, one per field path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    conditions: BTreeMap<String, Condition>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a compiled condition into the spec.
    ///
    /// Two ranges on the same field combine their bounds; any other
    /// condition replaces what the field had.
    pub fn and(mut self, filter: Option<FieldFilter>) -> Self {
        let Some(FieldFilter { field, condition }) = filter else {
            return self;
        };
        if let Condition::Range(bounds) = &condition {
            if let Some(Condition::Range(existing)) = self.conditions.get_mut(&field) {
                existing.extend(bounds.iter().map(|(op, v)| (*op, v.clone())));
                return self;
            }
        }
        self.conditions.insert(field, condition);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(field, c)| (field.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

// == Value Coercion ==
/// How members of an `in` list are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InMode {
    Text,
    Numeric,
}

/// Parses a number, keeping integers integral.
fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

fn list_values(field: &str, raw: Option<&str>, mode: InMode) -> Result<Vec<Value>> {
    split_list(raw)
        .into_iter()
        .map(|item| match mode {
            InMode::Text => Ok(Value::String(item.to_string())),
            InMode::Numeric => parse_number(item).ok_or_else(|| {
                CatalogError::InvalidParameter(format!(
                    "`{}` expects numbers, got `{}`",
                    field, item
                ))
            }),
        })
        .collect()
}

// == Compilers ==
/// `field` is one of the comma-separated values. Empty input contributes nothing.
pub fn is_in(field: &str, raw: Option<&str>, mode: InMode) -> Result<Option<FieldFilter>> {
    let values = list_values(field, raw, mode)?;
    Ok((!values.is_empty()).then(|| FieldFilter::new(field, Condition::In(values))))
}

/// `field` is none of the comma-separated values. Empty input contributes nothing.
pub fn not_in(field: &str, raw: Option<&str>, mode: InMode) -> Result<Option<FieldFilter>> {
    let values = list_values(field, raw, mode)?;
    Ok((!values.is_empty()).then(|| FieldFilter::new(field, Condition::NotIn(values))))
}

pub fn exists(field: &str, flag: Option<bool>) -> Option<FieldFilter> {
    flag.map(|flag| FieldFilter::new(field, Condition::Exists(flag)))
}

pub fn equals(field: &str, value: Option<impl Into<Value>>) -> Option<FieldFilter> {
    value.map(|value| FieldFilter::new(field, Condition::Equals(value.into())))
}

/// Range condition from a comma list applied positionally to `order`'s operators.
///
/// Values that parse as numbers compare numerically, anything else
/// (e.g. ISO dates) compares as a string.
pub fn compare(field: &str, raw: Option<&str>, order: RangeOrder) -> Result<Option<FieldFilter>> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let values: Vec<&str> = raw.split(',').map(str::trim).collect();
    let operators = order.operators();

    if values.len() != operators.len() {
        return Err(CatalogError::InvalidParameter(format!(
            "`{}` expects {} value(s) for order `{}`, got {}",
            field,
            operators.len(),
            order,
            values.len()
        )));
    }

    let mut bounds = BTreeMap::new();
    for (op, value) in operators.iter().zip(values) {
        if value.is_empty() {
            return Err(CatalogError::InvalidParameter(format!(
                "`{}` has an empty bound",
                field
            )));
        }
        let bound = parse_number(value).unwrap_or_else(|| Value::String(value.to_string()));
        bounds.insert(*op, bound);
    }
    Ok(Some(FieldFilter::new(field, Condition::Range(bounds))))
}

/// Expands year values into full-date bounds for `compare`.
///
/// A lower bound becomes January 1st, an upper bound December 31st. A
/// single year under `gte,lte` covers that whole year.
pub fn date_range(raw: Option<&str>, order: RangeOrder) -> Result<Option<String>> {
    let years = split_list(raw);
    if years.is_empty() {
        return Ok(None);
    }
    if let Some(bad) = years
        .iter()
        .find(|y| y.len() != 4 || !y.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(CatalogError::InvalidParameter(format!(
            "`{}` is not a year",
            bad
        )));
    }

    let start = |year: &str| format!("{}-01-01", year);
    let end = |year: &str| format!("{}-12-31", year);

    let dates = match (years.as_slice(), order) {
        ([year], RangeOrder::Gte) => vec![start(*year)],
        ([year], RangeOrder::Lte) => vec![end(*year)],
        ([year], RangeOrder::Between) => vec![start(*year), end(*year)],
        (many, _) => many
            .iter()
            .enumerate()
            .map(|(index, year)| if index == 0 { start(*year) } else { end(*year) })
            .collect(),
    };
    Ok(Some(dates.join(",")))
}
