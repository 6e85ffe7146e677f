//! Snapshots and table scans

use std::ops::Bound;

use tracing::trace;

use super::database::{normalize, read_state, SharedState};
use super::errors::StoreResult;
use crate::executor::{ExecutorError, ExecutorResult, Fetch, RowIterator};
use crate::mvcc::{CommitId, ReadView};
use crate::value::Schema;

/// An immutable view of the database as of one commit.
///
/// Later commits never change what a snapshot returns.
#[derive(Debug, Clone)]
pub struct Snapshot {
    state: SharedState,
    view: ReadView,
}

impl Snapshot {
    pub(crate) fn new(state: SharedState, view: ReadView) -> Self {
        Self { state, view }
    }

    /// Returns the read view
    pub fn view(&self) -> ReadView {
        self.view
    }

    /// Returns the commit this snapshot is bound to
    pub fn commit_id(&self) -> CommitId {
        self.view.upper_bound()
    }

    /// Returns the schema of `table`
    pub fn table_schema(&self, table: &str) -> StoreResult<Schema> {
        Ok(read_state(&self.state)?.table(table)?.schema.clone())
    }

    /// Opens a primary-key-order scan of `table`
    pub fn scan(&self, table: &str) -> StoreResult<TableScan> {
        read_state(&self.state)?.table(table)?;
        Ok(TableScan {
            state: self.state.clone(),
            table: normalize(table),
            view: self.view,
            cursor: Bound::Unbounded,
            done: false,
        })
    }
}

/// Streams rows of one table visible to a snapshot.
///
/// The store lock is held only for the duration of each `next` call; the
/// scan resumes after the last key it returned.
#[derive(Debug)]
pub struct TableScan {
    state: SharedState,
    table: String,
    view: ReadView,
    cursor: Bound<String>,
    done: bool,
}

impl RowIterator for TableScan {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        if self.done {
            return Ok(Fetch::End);
        }

        let state = read_state(&self.state)
            .map_err(|err| ExecutorError::execution_failed(err.to_string()))?;
        let table = state
            .table(&self.table)
            .map_err(|err| ExecutorError::execution_failed(err.to_string()))?;

        let range = (self.cursor.clone(), Bound::Unbounded);
        for (key, chain) in table.chains.range::<String, _>(range) {
            if let Some(row) = chain.visible_version(self.view).row() {
                trace!(table = %self.table, key = %key, "scan row");
                self.cursor = Bound::Excluded(key.clone());
                return Ok(Fetch::Row(row.clone()));
            }
        }

        self.done = true;
        Ok(Fetch::End)
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.done = true;
        Ok(())
    }
}
