//! Query differ
//!
//! Runs one query against two snapshots and reports the rows whose values
//! differ. Both plans have their ordering operator replaced by the two sides
//! of a shared [`MergeDiffer`]; the session then pulls the two plan roots in
//! lockstep and drops pairs that are equal on every column.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, info_span, Span};
use uuid::Uuid;

use super::config::DiffConfig;
use super::errors::{DiffError, DiffResult};
use super::inject::{find_ordering, splice, DiffSourceNode};
use super::merge::{MergeDiffer, MergeStep, Side};
use crate::executor::{ExecContext, ExecutorError, RowComparator, RowIterator};
use crate::planner::{parse_query, render_plan, PlanRef, QueryPlanner};
use crate::store::Snapshot;
use crate::value::{Row, Schema};

/// How a row changed between the two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffKind::Added => write!(f, "added"),
            DiffKind::Removed => write!(f, "removed"),
            DiffKind::Modified => write!(f, "modified"),
        }
    }
}

/// A differing pair; `None` marks the side where the row is absent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDiff {
    pub from: Option<Row>,
    pub to: Option<Row>,
}

impl RowDiff {
    pub fn kind(&self) -> DiffKind {
        match (&self.from, &self.to) {
            (None, _) => DiffKind::Added,
            (_, None) => DiffKind::Removed,
            _ => DiffKind::Modified,
        }
    }
}

impl fmt::Display for RowDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |row: &Option<Row>| row.as_ref().map_or("-".to_string(), Row::to_string);
        write!(f, "{}: {} -> {}", self.kind(), show(&self.from), show(&self.to))
    }
}

fn start_error(side: Side, plan: &PlanRef, source: ExecutorError) -> DiffError {
    DiffError::ExecutionStart {
        side,
        source,
        plan: render_plan(plan.as_ref()),
    }
}

/// One diff session
pub struct QueryDiffer {
    session: Uuid,
    span: Span,
    schema: Schema,
    from_root: Box<dyn RowIterator>,
    to_root: Box<dyn RowIterator>,
    diffs: usize,
    finished: bool,
    closed: bool,
}

impl QueryDiffer {
    /// Parses `query`, plans it against both snapshots and starts the diff
    pub fn make(
        query: &str,
        from: &Snapshot,
        to: &Snapshot,
        config: &DiffConfig,
    ) -> DiffResult<Self> {
        config.validate()?;
        let parsed = parse_query(query).map_err(DiffError::Parse)?;

        let from_plan = QueryPlanner::new(from)
            .plan(&parsed)
            .map_err(|source| DiffError::Analysis {
                side: Side::From,
                source,
            })?;
        let to_plan = QueryPlanner::new(to)
            .plan(&parsed)
            .map_err(|source| DiffError::Analysis {
                side: Side::To,
                source,
            })?;

        Self::from_plans(from_plan, to_plan, config)
    }

    /// Starts a diff over two analyzed plans of the same query
    pub fn from_plans(from_plan: PlanRef, to_plan: PlanRef, config: &DiffConfig) -> DiffResult<Self> {
        config.validate()?;
        let session = Uuid::new_v4();
        let span = info_span!("query_diff", session = %session);
        let entered = span.enter();

        let from_sort = find_ordering(&from_plan)?;
        let to_sort = find_ordering(&to_plan)?;

        let fields = match (from_sort.sort_fields(), to_sort.sort_fields()) {
            (Some(from), Some(to)) if from == to => from.to_vec(),
            _ => {
                return Err(DiffError::Unsupported {
                    reason: "from and to plans order rows differently".into(),
                    plan: render_plan(to_plan.as_ref()),
                })
            }
        };
        if from_plan.schema() != to_plan.schema() {
            return Err(DiffError::Unsupported {
                reason: "from and to plans produce different schemas".into(),
                plan: render_plan(to_plan.as_ref()),
            });
        }

        let from_iter = from_sort
            .row_iter(&ExecContext::new(Side::From.as_str()))
            .map_err(|source| start_error(Side::From, &from_plan, source))?;
        let to_iter = match to_sort.row_iter(&ExecContext::new(Side::To.as_str())) {
            Ok(iter) => iter,
            Err(source) => {
                let mut from_iter = from_iter;
                if let Err(err) = from_iter.close() {
                    debug!(error = %err, "closing from side after failed start");
                }
                return Err(start_error(Side::To, &to_plan, source));
            }
        };

        let merge = Arc::new(Mutex::new(MergeDiffer::new(
            from_iter,
            to_iter,
            RowComparator::new(fields),
            config,
        )));

        let mut roots = Vec::with_capacity(2);
        for (side, plan, sort) in [
            (Side::From, &from_plan, &from_sort),
            (Side::To, &to_plan, &to_sort),
        ] {
            let source: PlanRef = Arc::new(DiffSourceNode::new(
                side,
                sort.schema().clone(),
                Arc::clone(&merge),
            ));
            let spliced = splice(plan, &source).map_err(|err| DiffError::Unsupported {
                reason: err.to_string(),
                plan: render_plan(plan.as_ref()),
            })?;
            debug!(side = %side, plan = %render_plan(spliced.as_ref()), "diff source injected");

            let root = spliced
                .row_iter(&ExecContext::new(side.as_str()))
                .map_err(|source| start_error(side, plan, source))?;
            roots.push(root);
        }
        let (Some(to_root), Some(from_root)) = (roots.pop(), roots.pop()) else {
            return Err(ExecutorError::execution_failed("query diff roots missing").into());
        };

        info!("query diff session started");
        drop(entered);

        Ok(Self {
            session,
            span,
            schema: from_plan.schema().clone(),
            from_root,
            to_root,
            diffs: 0,
            finished: false,
            closed: false,
        })
    }

    /// Session id, as recorded on the session's tracing span
    pub fn session_id(&self) -> Uuid {
        self.session
    }

    /// Schema of the diffed rows
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the next differing pair, or `None` once both sides ended.
    ///
    /// Pairs equal on every column are skipped.
    pub fn next_diff(&mut self) -> DiffResult<Option<RowDiff>> {
        if self.closed {
            return Err(ExecutorError::execution_failed("query diff session is closed").into());
        }
        if self.finished {
            return Ok(None);
        }
        let _enter = self.span.enter();

        loop {
            let from = self.from_root.next()?;
            let to = self.to_root.next()?;

            let Some(step) = MergeStep::from_fetches(from, to)? else {
                self.finished = true;
                info!(diffs = self.diffs, "query diff exhausted");
                return Ok(None);
            };

            if let MergeStep::Matched(from, to) = &step {
                if from.equals(to, &self.schema).map_err(ExecutorError::from)? {
                    continue;
                }
            }

            self.diffs += 1;
            let (from, to) = step.into_pair();
            return Ok(Some(RowDiff { from, to }));
        }
    }

    /// Drains the remaining diffs, then closes the session
    pub fn collect_diffs(&mut self) -> DiffResult<Vec<RowDiff>> {
        let mut diffs = Vec::new();
        let drained = loop {
            match self.next_diff() {
                Ok(Some(diff)) => diffs.push(diff),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        let closed = self.close();
        drained?;
        closed?;
        Ok(diffs)
    }

    /// Closes both sides. When both fail the from side's error is returned.
    /// Closing again is a no-op.
    pub fn close(&mut self) -> DiffResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _enter = self.span.enter();

        let from = self.from_root.close();
        let to = self.to_root.close();
        info!(diffs = self.diffs, "query diff session closed");

        from?;
        to?;
        Ok(())
    }
}

impl fmt::Debug for QueryDiffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDiffer")
            .field("session", &self.session)
            .field("diffs", &self.diffs)
            .field("finished", &self.finished)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
