//! Versioned in-memory row store
//!
//! Tables hold one [`VersionChain`](crate::mvcc::VersionChain) per primary
//! key. Commits append versions atomically under a fresh commit identity; a
//! [`Snapshot`] is a read view over the whole database and streams table rows
//! visible at its bound.

mod database;
mod errors;
mod snapshot;

pub use database::{CommitRecord, Database, WriteBatch};
pub use errors::{StoreError, StoreResult};
pub use snapshot::{Snapshot, TableScan};
