//! VersionChain - Version history for one primary key
//!
//! Versions are kept in commit order. The chain is a data container; the
//! visibility rule lives in [`super::Visibility`].

use super::{ReadView, Version, Visibility, VisibilityResult};

/// The complete version history of a single row key.
#[derive(Clone, Debug)]
pub struct VersionChain {
    key: String,
    versions: Vec<Version>,
}

impl VersionChain {
    /// Creates a new empty version chain for the given key.
    pub fn new(key: String) -> Self {
        Self {
            key,
            versions: Vec::new(),
        }
    }

    /// Returns the key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the number of versions in this chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if this chain has no versions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Returns all versions; no visibility filtering is performed.
    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Appends a version to this chain.
    pub fn push(&mut self, version: Version) {
        self.versions.push(version);
    }

    /// Finds the version visible under `view`.
    pub fn visible_version(&self, view: ReadView) -> VisibilityResult<'_> {
        Visibility::visible_version(self, view)
    }
}
