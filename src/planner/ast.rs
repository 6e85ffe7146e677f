//! Query AST structures
//!
//! The parsed, unresolved query: names only, no positions or types.

use super::expr::{FilterOp, NullOrdering, SortDirection};
use crate::value::Value;

/// Projection list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    /// `SELECT *`
    All,
    /// Named columns in output order
    Columns(Vec<String>),
}

/// A single `WHERE` condition on a named column
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Column name
    pub column: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Condition {
    pub fn new(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }

    /// Equality condition
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq(value.into()))
    }
}

/// One `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Column name
    pub column: String,
    /// Sort direction
    pub direction: SortDirection,
    /// Explicit null placement; `None` uses the direction's default
    pub nulls: Option<NullOrdering>,
}

impl OrderTerm {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
            nulls: None,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
            nulls: None,
        }
    }

    pub fn with_nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Null placement after applying defaults
    pub fn effective_nulls(&self) -> NullOrdering {
        self.nulls
            .unwrap_or_else(|| NullOrdering::default_for(self.direction))
    }
}

/// Parsed query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Projection
    pub select: SelectList,
    /// Source table
    pub table: String,
    /// Filter conditions (all combined with AND)
    pub conditions: Vec<Condition>,
    /// Sort key; empty means unordered
    pub order_by: Vec<OrderTerm>,
}

impl Query {
    /// Creates a `SELECT * FROM table` query
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            select: SelectList::All,
            table: table.into(),
            conditions: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Sets the projected columns
    pub fn select(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = SelectList::Columns(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Appends an order term
    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order_by.push(term);
        self
    }

    /// Returns true if the query has an `ORDER BY`
    pub fn is_ordered(&self) -> bool {
        !self.order_by.is_empty()
    }
}
