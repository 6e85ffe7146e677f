//! Commit Authority - commit identity assignment
//!
//! - Commit identities are assigned exactly once
//! - The ordering is total and strict

use super::CommitId;

/// Hands out strictly increasing commit identities.
#[derive(Debug, Default)]
pub struct CommitAuthority {
    highest_commit_id: u64,
}

impl CommitAuthority {
    /// Creates an authority for an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highest identity assigned so far.
    pub fn highest(&self) -> CommitId {
        CommitId::new(self.highest_commit_id)
    }

    /// Assigns the next commit identity.
    pub fn next_commit_id(&mut self) -> CommitId {
        self.highest_commit_id += 1;
        CommitId::new(self.highest_commit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_authority_starts_at_origin() {
        let authority = CommitAuthority::new();
        assert_eq!(authority.highest(), CommitId::ORIGIN);
    }

    #[test]
    fn test_identities_strictly_increase() {
        let mut authority = CommitAuthority::new();
        let a = authority.next_commit_id();
        let b = authority.next_commit_id();
        assert!(a < b);
        assert_eq!(authority.highest(), b);
    }
}
