//! MVCC Visibility - snapshot isolation rule
//!
//! Given a read view `R` and a version chain `V₀ … Vₙ` in commit order, the
//! visible version `V*` is:
//! 1. Consider only versions where `V.commit_id ≤ R.read_upper_bound`
//! 2. From those, select the version with the largest commit_id
//! 3. If that version is a tombstone, the key is invisible

use super::{ReadView, Version, VersionChain};
use crate::value::Row;

/// Result of visibility evaluation for a key.
#[derive(Debug, Clone, PartialEq)]
pub enum VisibilityResult<'a> {
    /// A visible row version exists
    Visible(&'a Version),
    /// No versions within bound, or the latest one is a tombstone
    Invisible,
}

impl<'a> VisibilityResult<'a> {
    /// Returns the visible version if any
    pub fn version(&self) -> Option<&'a Version> {
        match self {
            VisibilityResult::Visible(v) => Some(v),
            VisibilityResult::Invisible => None,
        }
    }

    /// Returns the visible row if any
    pub fn row(&self) -> Option<&'a Row> {
        self.version().and_then(Version::row)
    }

    /// Returns true if visible
    pub fn is_visible(&self) -> bool {
        matches!(self, VisibilityResult::Visible(_))
    }
}

/// Stateless visibility resolver
pub struct Visibility;

impl Visibility {
    /// Evaluates visibility for a version chain given a read view.
    pub fn visible_version(chain: &VersionChain, view: ReadView) -> VisibilityResult<'_> {
        let upper_bound = view.upper_bound();

        let visible = chain
            .versions()
            .iter()
            .filter(|v| v.commit_id() <= upper_bound)
            .max_by_key(|v| v.commit_id());

        match visible {
            Some(version) if !version.is_tombstone() => VisibilityResult::Visible(version),
            _ => VisibilityResult::Invisible,
        }
    }
}
