//! Sort compiler

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Single-field ordering handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// No field means the store's default ordering. Direction defaults to descending.
pub fn sort(field: Option<&str>, direction: Option<SortDirection>) -> Option<SortSpec> {
    field.filter(|f| !f.is_empty()).map(|field| SortSpec {
        field: field.to_string(),
        direction: direction.unwrap_or_default(),
    })
}
