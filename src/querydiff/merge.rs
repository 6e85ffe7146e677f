//! Merge differ
//!
//! Aligns two streams ordered by the same sort key and emits only rows
//! that may differ. Two entry points, one per side, form a strict
//! alternating protocol:
//!
//! 1. `next_from_row` compares the two heads and records the result
//! 2. `next_to_row` consumes that result and resets it to `Unknown`
//!
//! | comparison | from side  | to side    |
//! |------------|------------|------------|
//! | Less       | row        | Retry      |
//! | Equal      | row        | row        |
//! | Greater    | Retry      | row        |
//!
//! Once one side is exhausted the other drains unconditionally. Calls out of
//! this order are FATAL errors. [`MergeDiffer::advance`] runs one exchange
//! and returns the tagged outcome.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::config::DiffConfig;
use super::lookahead::{recorded, LookaheadQueue, SharedError};
use crate::executor::{ExecutorError, ExecutorResult, Fetch, RowComparator, RowIterator};
use crate::value::Row;

/// One of the two diffed executions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    From,
    To,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::From => "from",
            Side::To => "to",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison of the current heads, carried from one call to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareState {
    Unknown,
    CompareDone(Ordering),
}

/// Outcome of one merge exchange
#[derive(Debug, Clone, PartialEq)]
pub enum MergeStep {
    /// Key present only on the from side
    FromOnly(Row),
    /// Key present only on the to side
    ToOnly(Row),
    /// Equal keys; the rows may still differ outside the key
    Matched(Row, Row),
}

impl MergeStep {
    /// Pairs one from-side and one to-side pull.
    ///
    /// `Ok(None)` once both sides ended. A pair with no row on either side
    /// that is not a double end means the protocol was broken.
    pub fn from_fetches(from: Fetch, to: Fetch) -> ExecutorResult<Option<Self>> {
        match (from, to) {
            (Fetch::End, Fetch::End) => Ok(None),
            (Fetch::Row(from), Fetch::Row(to)) => Ok(Some(MergeStep::Matched(from, to))),
            (Fetch::Row(from), _) => Ok(Some(MergeStep::FromOnly(from))),
            (_, Fetch::Row(to)) => Ok(Some(MergeStep::ToOnly(to))),
            _ => Err(ExecutorError::out_of_order("both")),
        }
    }

    /// Returns the (from, to) pair with absent sides as `None`
    pub fn into_pair(self) -> (Option<Row>, Option<Row>) {
        match self {
            MergeStep::FromOnly(from) => (Some(from), None),
            MergeStep::ToOnly(to) => (None, Some(to)),
            MergeStep::Matched(from, to) => (Some(from), Some(to)),
        }
    }
}

/// Merges two ordered streams through lookahead queues
pub struct MergeDiffer {
    from: LookaheadQueue,
    to: LookaheadQueue,
    comparator: RowComparator,
    state: CompareState,
    errors: SharedError,
}

impl MergeDiffer {
    /// Creates a differ over two streams ordered by `comparator`
    pub fn new(
        from: Box<dyn RowIterator>,
        to: Box<dyn RowIterator>,
        comparator: RowComparator,
        config: &DiffConfig,
    ) -> Self {
        let errors = SharedError::default();
        Self {
            from: LookaheadQueue::new(Side::From, from, config, SharedError::clone(&errors)),
            to: LookaheadQueue::new(Side::To, to, config, SharedError::clone(&errors)),
            comparator,
            state: CompareState::Unknown,
            errors,
        }
    }

    /// Returns the comparator aligning the two streams
    pub fn comparator(&self) -> &RowComparator {
        &self.comparator
    }

    fn start(&mut self) -> ExecutorResult<()> {
        self.from.maybe_start()?;
        self.to.maybe_start()
    }

    fn pop(&mut self, side: Side) -> ExecutorResult<Fetch> {
        let queue = match side {
            Side::From => &mut self.from,
            Side::To => &mut self.to,
        };
        let row = queue.pop()?.ok_or_else(ExecutorError::null_row)?;
        Ok(Fetch::Row(row))
    }

    fn compare_heads(&mut self) -> ExecutorResult<Ordering> {
        let from = self.from.peek()?;
        let to = self.to.peek()?;
        match (from, to) {
            (Some(from), Some(to)) => self.comparator.compare(from, to),
            _ => Err(ExecutorError::null_row()),
        }
    }

    /// Pulls the from side.
    ///
    /// Returns the next from-row, `Retry` when the to side must catch up
    /// first, or `End` once the from side is exhausted.
    pub fn next_from_row(&mut self) -> ExecutorResult<Fetch> {
        self.start()?;

        if self.from.is_done()? {
            return Ok(Fetch::End);
        }
        if self.to.is_done()? {
            return self.pop(Side::From);
        }

        if self.state != CompareState::Unknown {
            return Err(ExecutorError::out_of_order(Side::From));
        }

        let ordering = self.compare_heads()?;
        self.state = CompareState::CompareDone(ordering);
        trace!(?ordering, "compared heads");

        match ordering {
            Ordering::Less | Ordering::Equal => self.pop(Side::From),
            Ordering::Greater => Ok(Fetch::Retry),
        }
    }

    /// Pulls the to side, consuming the comparison left by `next_from_row`
    pub fn next_to_row(&mut self) -> ExecutorResult<Fetch> {
        self.start()?;

        if self.to.is_done()? {
            return Ok(Fetch::End);
        }

        match std::mem::replace(&mut self.state, CompareState::Unknown) {
            CompareState::Unknown => {
                if self.from.is_done()? {
                    self.pop(Side::To)
                } else {
                    Err(ExecutorError::out_of_order(Side::To))
                }
            }
            CompareState::CompareDone(Ordering::Less) => Ok(Fetch::Retry),
            CompareState::CompareDone(Ordering::Equal | Ordering::Greater) => self.pop(Side::To),
        }
    }

    /// Pulls `side`
    pub fn next_row(&mut self, side: Side) -> ExecutorResult<Fetch> {
        match side {
            Side::From => self.next_from_row(),
            Side::To => self.next_to_row(),
        }
    }

    /// Runs one from/to exchange; `None` once both sides are exhausted
    pub fn advance(&mut self) -> ExecutorResult<Option<MergeStep>> {
        let from = self.next_from_row()?;
        let to = self.next_to_row()?;
        MergeStep::from_fetches(from, to)
    }

    /// Closes one side's queue
    pub fn close_side(&mut self, side: Side) -> ExecutorResult<()> {
        match side {
            Side::From => self.from.close(),
            Side::To => self.to.close(),
        }
    }

    /// Closes both queues; the from side's error wins
    pub fn close(&mut self) -> ExecutorResult<()> {
        let from = self.from.close();
        let to = self.to.close();
        from?;
        to?;
        recorded(&self.errors)
    }
}
