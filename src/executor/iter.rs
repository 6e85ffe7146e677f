//! Pull-based row iteration
//!
//! Every operator produces rows through [`RowIterator`]. A call yields one
//! [`Fetch`]: a row, the end of the stream, or `Retry` when a diff-backed
//! source has nothing for this side at the current merge position.

use std::collections::VecDeque;

use super::errors::ExecutorResult;
use crate::value::Row;

/// Outcome of one pull
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// The next row
    Row(Row),
    /// No row at this merge position; the other side must advance first.
    /// Only diff-backed sources produce it; row-preserving operators pass it up.
    Retry,
    /// End of stream
    End,
}

impl Fetch {
    /// Returns the row, if any
    pub fn into_row(self) -> Option<Row> {
        match self {
            Fetch::Row(row) => Some(row),
            Fetch::Retry | Fetch::End => None,
        }
    }

    /// Returns true at end of stream
    pub fn is_end(&self) -> bool {
        matches!(self, Fetch::End)
    }
}

/// A lazy, finite, non-restartable row stream.
///
/// Iterators are moved onto background prefetch workers, hence `Send`.
pub trait RowIterator: Send {
    /// Pulls the next item
    fn next(&mut self) -> ExecutorResult<Fetch>;

    /// Releases resources held by the iterator
    fn close(&mut self) -> ExecutorResult<()>;
}

impl<I: RowIterator + ?Sized> RowIterator for Box<I> {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        (**self).next()
    }

    fn close(&mut self) -> ExecutorResult<()> {
        (**self).close()
    }
}

/// Per-execution context handed to `row_iter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
    label: String,
}

impl ExecContext {
    /// Creates a context labelled for logs (e.g. `"from"`, `"to"`)
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the label
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Iterator over rows already in memory
#[derive(Debug, Default)]
pub struct VecRowIter {
    rows: VecDeque<Row>,
}

impl VecRowIter {
    /// Creates an iterator yielding `rows` in order
    pub fn new(rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }
}

impl RowIterator for VecRowIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        Ok(self.rows.pop_front().map_or(Fetch::End, Fetch::Row))
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.rows.clear();
        Ok(())
    }
}

/// Drains an iterator into memory, skipping `Retry` items.
///
/// The iterator is closed afterwards; a close failure is reported only when
/// draining itself succeeded.
pub fn collect_rows(iter: &mut dyn RowIterator) -> ExecutorResult<Vec<Row>> {
    let mut rows = Vec::new();
    let drained = loop {
        match iter.next() {
            Ok(Fetch::Row(row)) => rows.push(row),
            Ok(Fetch::Retry) => continue,
            Ok(Fetch::End) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    let closed = iter.close();
    drained?;
    closed?;
    Ok(rows)
}
