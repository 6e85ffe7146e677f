//! MVCC domain types
//!
//! A dataset version ("snapshot") is a [`ReadView`] over version chains:
//! - `CommitId` - totally ordered commit identity
//! - `Version` - immutable row version or tombstone
//! - `VersionChain` - version history for one primary key
//! - `ReadView` - stable snapshot boundary
//! - `CommitAuthority` - commit identity assignment
//! - `Visibility` - snapshot visibility rule

mod commit_authority;
mod commit_id;
mod read_view;
mod version;
mod version_chain;
mod visibility;

pub use commit_authority::CommitAuthority;
pub use commit_id::CommitId;
pub use read_view::ReadView;
pub use version::{Version, VersionPayload};
pub use version_chain::VersionChain;
pub use visibility::{Visibility, VisibilityResult};
