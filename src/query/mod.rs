//! Query Module
//!
//! Stateless compilers from query-string parameters to store filters and
//! sort descriptors.

mod filter;
mod sort;

pub use filter::{
    compare, date_range, equals, exists, is_in, not_in, Condition, FieldFilter, FilterSpec,
    InMode, RangeOp, RangeOrder,
};
pub use sort::{sort, SortDirection, SortSpec};
