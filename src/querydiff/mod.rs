//! Query result diffing across two snapshots
//!
//! Both result streams are already ordered by the query's own sort keys, so
//! the diff is a synchronized merge instead of a materialized comparison.
//!
//! # Components
//!
//! - [`LookaheadQueue`] - per-side background prefetch with peek
//! - [`MergeDiffer`] - aligns the two ordered streams by sort key
//! - [`inject`] - swaps each plan's ordering operator for a merge-backed leaf
//! - [`QueryDiffer`] - session façade returning differing row pairs
//!
//! # Invariants
//!
//! - Every row of both sides is visited exactly once, in key order
//! - Out-of-order merge calls are FATAL, never silently wrong diffs
//! - The first background error of a session wins and is re-surfaced on the
//!   next foreground call

mod config;
mod differ;
mod errors;
pub mod inject;
mod lookahead;
mod merge;

pub use config::DiffConfig;
pub use differ::{DiffKind, QueryDiffer, RowDiff};
pub use errors::{DiffError, DiffResult};
pub use inject::DiffSourceNode;
pub use lookahead::LookaheadQueue;
pub use merge::{MergeDiffer, MergeStep, Side};
