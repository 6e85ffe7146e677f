//! Store errors

use thiserror::Error;

use crate::mvcc::CommitId;
use crate::value::ValueError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    UnknownTable(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Primary key column {index} out of range for table '{table}'")]
    InvalidPrimaryKey { table: String, index: usize },

    #[error("Primary key of table '{0}' cannot be null")]
    NullPrimaryKey(String),

    #[error("Invalid row for table '{table}': {source}")]
    InvalidRow {
        table: String,
        #[source]
        source: ValueError,
    },

    #[error("Commit {0} does not exist")]
    UnknownCommit(CommitId),

    #[error("Store lock poisoned")]
    LockPoisoned,
}
