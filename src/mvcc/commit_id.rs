//! CommitId - Totally ordered commit identity
//!
//! - Totally orders all commits of a database
//! - Independent of wall-clock time
//! - No two commits share the same identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// A totally ordered, opaque commit identity.
///
/// Commit identities are the sole authority for visibility: a snapshot sees
/// exactly the versions committed at or before its bound.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CommitId(u64);

impl CommitId {
    /// The identity preceding every commit; a view bounded here sees nothing.
    pub const ORIGIN: CommitId = CommitId(0);

    /// Creates a new CommitId with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
