//! Projection operator

use super::errors::ExecutorResult;
use super::iter::{Fetch, RowIterator};
use crate::value::{Row, Value};

/// Keeps the columns at `indices`, in that order.
///
/// Row-preserving: one input item yields exactly one output item, so
/// `Retry` and `End` pass straight through.
pub struct ProjectIter {
    child: Box<dyn RowIterator>,
    indices: Vec<usize>,
}

impl ProjectIter {
    pub fn new(child: Box<dyn RowIterator>, indices: Vec<usize>) -> Self {
        Self { child, indices }
    }

    fn project(&self, row: &Row) -> ExecutorResult<Row> {
        let values = self
            .indices
            .iter()
            .map(|&i| row.get(i).cloned())
            .collect::<Result<Vec<Value>, _>>()?;
        Ok(Row::new(values))
    }
}

impl RowIterator for ProjectIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        match self.child.next()? {
            Fetch::Row(row) => Ok(Fetch::Row(self.project(&row)?)),
            other => Ok(other),
        }
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.child.close()
    }
}
