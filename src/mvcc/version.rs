//! Version - Immutable row version
//!
//! A version carries either a complete row or an explicit tombstone, plus the
//! commit identity that produced it. Updates create new versions; deletes are
//! tombstone versions ordered in the chain like any other.

use super::CommitId;
use crate::value::Row;

/// The payload of a version: either a row or an explicit tombstone.
#[derive(Clone, Debug, PartialEq)]
pub enum VersionPayload {
    /// A complete row.
    Row(Row),
    /// An explicit deletion marker.
    Tombstone,
}

impl VersionPayload {
    /// Returns true if this payload is a tombstone.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, VersionPayload::Tombstone)
    }
}

/// A single immutable row version.
///
/// All fields are private to enforce immutability.
#[derive(Clone, Debug, PartialEq)]
pub struct Version {
    key: String,
    payload: VersionPayload,
    commit_id: CommitId,
}

impl Version {
    /// Creates a new version.
    pub fn new(key: String, payload: VersionPayload, commit_id: CommitId) -> Self {
        Self {
            key,
            payload,
            commit_id,
        }
    }

    /// Creates a version holding `row`.
    pub fn with_row(key: String, row: Row, commit_id: CommitId) -> Self {
        Self::new(key, VersionPayload::Row(row), commit_id)
    }

    /// Creates a tombstone version.
    pub fn with_tombstone(key: String, commit_id: CommitId) -> Self {
        Self::new(key, VersionPayload::Tombstone, commit_id)
    }

    /// Returns the primary key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a reference to the payload.
    #[inline]
    pub fn payload(&self) -> &VersionPayload {
        &self.payload
    }

    /// Returns the row, or `None` for a tombstone.
    #[inline]
    pub fn row(&self) -> Option<&Row> {
        match &self.payload {
            VersionPayload::Row(row) => Some(row),
            VersionPayload::Tombstone => None,
        }
    }

    /// Returns the commit identity.
    #[inline]
    pub fn commit_id(&self) -> CommitId {
        self.commit_id
    }

    /// Returns true if this version is a tombstone.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_tombstone()
    }
}
