//! Predicate filtering
//!
//! Predicates are ANDed. Comparisons follow SQL null semantics: any ordered
//! comparison against a null yields false; only `IS NULL` matches nulls.

use super::errors::ExecutorResult;
use super::iter::{Fetch, RowIterator};
use crate::planner::{FilterOp, Predicate};
use crate::value::Row;

/// Evaluates predicates against rows
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a row matches all predicates
    pub fn matches(row: &Row, predicates: &[Predicate]) -> ExecutorResult<bool> {
        for predicate in predicates {
            if !Self::matches_predicate(row, predicate)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_predicate(row: &Row, predicate: &Predicate) -> ExecutorResult<bool> {
        let value = predicate.column.eval(row)?;

        match &predicate.op {
            FilterOp::IsNull => return Ok(value.is_null()),
            FilterOp::IsNotNull => return Ok(!value.is_null()),
            _ => {}
        }

        let operand = match predicate.op.operand() {
            Some(operand) if !operand.is_null() && !value.is_null() => operand,
            _ => return Ok(false),
        };

        let ordering = predicate.column.data_type.compare(value, operand)?;
        Ok(match &predicate.op {
            FilterOp::Eq(_) => ordering.is_eq(),
            FilterOp::Ne(_) => ordering.is_ne(),
            FilterOp::Lt(_) => ordering.is_lt(),
            FilterOp::Lte(_) => ordering.is_le(),
            FilterOp::Gt(_) => ordering.is_gt(),
            FilterOp::Gte(_) => ordering.is_ge(),
            FilterOp::IsNull | FilterOp::IsNotNull => unreachable!("handled above"),
        })
    }
}

/// Filter operator
pub struct FilterIter {
    child: Box<dyn RowIterator>,
    predicates: Vec<Predicate>,
}

impl FilterIter {
    pub fn new(child: Box<dyn RowIterator>, predicates: Vec<Predicate>) -> Self {
        Self { child, predicates }
    }
}

impl RowIterator for FilterIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        loop {
            match self.child.next()? {
                Fetch::Row(row) => {
                    if PredicateFilter::matches(&row, &self.predicates)? {
                        return Ok(Fetch::Row(row));
                    }
                }
                other => return Ok(other),
            }
        }
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.child.close()
    }
}
