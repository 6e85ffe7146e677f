//! Query Planner subsystem
//!
//! Turns query text into an executable plan tree bound to one snapshot.
//!
//! # Design Principles
//!
//! - Deterministic: same query and snapshot → same plan
//! - Explicit: unknown names and mistyped literals are rejected, never guessed
//! - Order-preserving: nothing above the sort drops or reorders rows
//!
//! # Plan shape
//!
//! `Project? ( Sort? ( Filter? ( Scan ) ) )`; the sort node is the plan's
//! ordering operator and exposes its sort key.

mod ast;
mod errors;
mod explain;
mod expr;
mod parser;
mod plan;
mod planner;

pub use ast::{Condition, OrderTerm, Query, SelectList};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use explain::{render_plan, ExplainLine, ExplainPlan};
pub use expr::{ColumnRef, FilterOp, NullOrdering, Predicate, SortDirection, SortField};
pub use parser::parse_query;
pub use plan::{FilterNode, PlanNode, PlanRef, ProjectNode, ScanNode, SortNode};
pub use planner::QueryPlanner;
