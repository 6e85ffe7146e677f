//! Query executor subsystem
//!
//! Plans execute as trees of pull-based [`RowIterator`]s.
//!
//! # Operators
//!
//! - Scan: streams rows visible to a snapshot (see `store`)
//! - Filter: drops rows failing any predicate
//! - Sort: orders rows with [`RowComparator`]
//! - Project: keeps selected columns
//!
//! # Invariants
//!
//! - One comparator defines row order for sort and diff alike
//! - Evaluation failures abort execution; no partial results

mod errors;
mod filters;
mod iter;
mod project;
mod sorter;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use filters::{FilterIter, PredicateFilter};
pub use iter::{collect_rows, ExecContext, Fetch, RowIterator, VecRowIter};
pub use project::ProjectIter;
pub use sorter::{RowComparator, SortIter};
