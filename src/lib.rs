//! querydiff - ordered merge diff of one query across two database snapshots
//!
//! A query runs against a "from" and a "to" snapshot of a versioned store;
//! the rows that differ between the two results are reported as
//! added, removed or modified pairs.
//!
//! ```
//! use querydiff::querydiff::{DiffConfig, DiffKind, QueryDiffer};
//! use querydiff::row;
//! use querydiff::store::{Database, WriteBatch};
//! use querydiff::value::{Column, DataType, Schema};
//!
//! let db = Database::new();
//! db.create_table(
//!     "t",
//!     Schema::new([Column::required("id", DataType::Int), Column::new("v", DataType::Text)]),
//!     0,
//! )
//! .unwrap();
//! let c1 = db.commit(WriteBatch::new().put("t", row![1, "a"]), "one").unwrap();
//! db.commit(WriteBatch::new().put("t", row![1, "b"]), "two").unwrap();
//!
//! let from = db.snapshot_at(c1).unwrap();
//! let to = db.snapshot().unwrap();
//! let mut differ =
//!     QueryDiffer::make("SELECT * FROM t ORDER BY id", &from, &to, &DiffConfig::default()).unwrap();
//! let diffs = differ.collect_diffs().unwrap();
//! assert_eq!(diffs.len(), 1);
//! assert_eq!(diffs[0].kind(), DiffKind::Modified);
//! ```

pub mod executor;
pub mod mvcc;
pub mod planner;
pub mod querydiff;
pub mod store;
pub mod value;

pub use self::querydiff::{DiffConfig, DiffError, DiffKind, DiffResult, QueryDiffer, RowDiff};
