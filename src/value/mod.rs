//! Typed scalar values and rows
//!
//! Rows flowing through plans and the differ are ordered sequences of
//! [`Value`]s bound to a [`Schema`]. Each column's [`DataType`] owns the
//! comparator used both by the sort operator and by the merge differ.

mod errors;
mod row;
mod types;

pub use errors::{ValueError, ValueResult};
pub use row::{Column, Row, Schema};
pub use types::{DataType, Value};
