//! Value and row errors

use thiserror::Error;

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors raised while comparing or validating values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// Value does not belong to the column's type
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Float comparison involving NaN
    #[error("Incomparable float value: {0}")]
    Incomparable(f64),

    /// Row width does not match the schema
    #[error("Row has {actual} values, schema expects {expected}")]
    ArityMismatch { expected: usize, actual: usize },

    /// Column index outside the row
    #[error("Column index {index} out of range for row of {len} values")]
    ColumnOutOfRange { index: usize, len: usize },

    /// Null written to a non-nullable column
    #[error("Column '{0}' is not nullable")]
    NotNullable(String),

    /// JSON value cannot be represented as a scalar
    #[error("Unsupported JSON value: {0}")]
    UnsupportedJson(String),
}
