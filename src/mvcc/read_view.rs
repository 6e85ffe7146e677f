//! ReadView - Stable snapshot boundary
//!
//! A read view is defined by a single scalar: the maximum commit identity
//! visible to reads made through it. It never changes once established.

use super::CommitId;

/// A stable snapshot boundary for read operations.
///
/// All versions with `commit_id > upper_bound` are invisible.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ReadView {
    read_upper_bound: CommitId,
}

impl ReadView {
    /// Creates a new read view with the given upper bound.
    #[inline]
    pub fn new(upper_bound: CommitId) -> Self {
        Self {
            read_upper_bound: upper_bound,
        }
    }

    /// Returns the upper bound commit identity.
    #[inline]
    pub fn upper_bound(&self) -> CommitId {
        self.read_upper_bound
    }
}
