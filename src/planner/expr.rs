//! Resolved expressions carried by plan nodes
//!
//! Column names from the query are resolved to positions during analysis, so
//! operators evaluate against rows without name lookups.

use std::fmt;

use crate::value::{DataType, Row, Value, ValueResult};

/// A column resolved to its position in the input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Position in the input row
    pub index: usize,
    /// Column name, for explain output
    pub name: String,
    /// Column type; owns the comparator
    pub data_type: DataType,
}

impl ColumnRef {
    pub fn new(index: usize, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            index,
            name: name.into(),
            data_type,
        }
    }

    /// Evaluates the column against `row`
    pub fn eval<'r>(&self, row: &'r Row) -> ValueResult<&'r Value> {
        row.get(self.index)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Where nulls go, independent of direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    NullsFirst,
    NullsLast,
}

impl NullOrdering {
    /// Default placement: nulls act as the smallest value, so they lead an
    /// ascending sort and trail a descending one.
    pub fn default_for(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => NullOrdering::NullsFirst,
            SortDirection::Descending => NullOrdering::NullsLast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NullOrdering::NullsFirst => "NULLS FIRST",
            NullOrdering::NullsLast => "NULLS LAST",
        }
    }
}

/// One entry of a sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub column: ColumnRef,
    pub direction: SortDirection,
    pub nulls: NullOrdering,
}

impl SortField {
    /// Ascending with default null placement
    pub fn asc(column: ColumnRef) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
            nulls: NullOrdering::NullsFirst,
        }
    }

    /// Descending with default null placement
    pub fn desc(column: ColumnRef) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
            nulls: NullOrdering::NullsLast,
        }
    }

    /// Overrides null placement
    pub fn with_nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.column,
            self.direction.as_str(),
            self.nulls.as_str()
        )
    }
}

/// Comparison operators usable in filters
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    IsNull,
    IsNotNull,
}

impl FilterOp {
    /// Returns the operator symbol for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "=",
            FilterOp::Ne(_) => "!=",
            FilterOp::Lt(_) => "<",
            FilterOp::Lte(_) => "<=",
            FilterOp::Gt(_) => ">",
            FilterOp::Gte(_) => ">=",
            FilterOp::IsNull => "IS NULL",
            FilterOp::IsNotNull => "IS NOT NULL",
        }
    }

    /// Returns the literal operand, if any
    pub fn operand(&self) -> Option<&Value> {
        match self {
            FilterOp::Eq(v)
            | FilterOp::Ne(v)
            | FilterOp::Lt(v)
            | FilterOp::Lte(v)
            | FilterOp::Gt(v)
            | FilterOp::Gte(v) => Some(v),
            FilterOp::IsNull | FilterOp::IsNotNull => None,
        }
    }
}

/// A resolved filter predicate (all predicates are ANDed)
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: ColumnRef,
    pub op: FilterOp,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op.operand() {
            Some(value) => write!(f, "{} {} {}", self.column, self.op.op_name(), value),
            None => write!(f, "{} {}", self.column, self.op.op_name()),
        }
    }
}
