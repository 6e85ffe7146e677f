//! Query Diff Plan Integration Tests
//!
//! Diffs over hand-built plans exercising the plan node capabilities:
//! - The ordering operator is found through single-child links only
//! - Broken alternation above the ordering operator is FATAL
//! - Background failures surface on the next pull and on close
//! - Closing mid-stream stops unbounded sources

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use querydiff::executor::{
    ExecContext, ExecutorError, ExecutorErrorCode, ExecutorResult, Fetch, RowIterator, VecRowIter,
};
use querydiff::planner::{
    ColumnRef, FilterNode, FilterOp, PlanNode, PlanRef, PlannerResult, Predicate, ProjectNode,
    SortField, SortNode,
};
use querydiff::row;
use querydiff::value::{Column, DataType, Row, Schema, Value};
use querydiff::{DiffConfig, DiffError, QueryDiffer, RowDiff};

// =============================================================================
// Test Plan Nodes
// =============================================================================

fn schema() -> Schema {
    Schema::new([
        Column::required("id", DataType::Int),
        Column::new("v", DataType::Text),
    ])
}

fn by_id() -> Vec<SortField> {
    vec![SortField::asc(ColumnRef::new(0, "id", DataType::Int))]
}

/// Leaf yielding fixed rows, or failing to start
#[derive(Debug, Clone)]
struct RowsNode {
    rows: Vec<Row>,
    fail_start: bool,
    schema: Schema,
}

impl RowsNode {
    fn plan(rows: Vec<Row>) -> PlanRef {
        Arc::new(Self {
            rows,
            fail_start: false,
            schema: schema(),
        })
    }

    fn failing_start() -> PlanRef {
        Arc::new(Self {
            rows: Vec::new(),
            fail_start: true,
            schema: schema(),
        })
    }
}

impl PlanNode for RowsNode {
    fn name(&self) -> &'static str {
        "Rows"
    }

    fn describe(&self) -> String {
        format!("count={}", self.rows.len())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn children(&self) -> Vec<PlanRef> {
        Vec::new()
    }

    fn with_children(&self, _children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        Ok(Arc::new(self.clone()))
    }

    fn row_iter(&self, _ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        if self.fail_start {
            return Err(ExecutorError::execution_failed("source offline"));
        }
        Ok(Box::new(VecRowIter::new(self.rows.clone())))
    }
}

/// Yields `ok` rows, then fails
struct FailingIter {
    next_id: i64,
    ok: i64,
}

impl RowIterator for FailingIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        if self.next_id >= self.ok {
            return Err(ExecutorError::execution_failed("read failed mid-stream"));
        }
        self.next_id += 1;
        Ok(Fetch::Row(row![self.next_id, "x"]))
    }

    fn close(&mut self) -> ExecutorResult<()> {
        Ok(())
    }
}

/// Unbounded ascending ids `0, step, 2*step, ...`; counts closes
struct CountingIter {
    next_id: i64,
    step: i64,
    closes: Arc<AtomicUsize>,
}

impl RowIterator for CountingIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        let id = self.next_id;
        self.next_id += self.step;
        Ok(Fetch::Row(row![id, "x"]))
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

enum StreamKind {
    Failing { ok: i64 },
    Counting { step: i64, closes: Arc<AtomicUsize> },
}

/// An ordering operator over a custom stream, already ordered by id
#[derive(Clone)]
struct OrderedStreamNode {
    kind: Arc<StreamKind>,
    fields: Vec<SortField>,
    schema: Schema,
}

impl OrderedStreamNode {
    fn plan(kind: StreamKind) -> PlanRef {
        Arc::new(Self {
            kind: Arc::new(kind),
            fields: by_id(),
            schema: schema(),
        })
    }
}

impl std::fmt::Debug for OrderedStreamNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OrderedStreamNode")
    }
}

impl PlanNode for OrderedStreamNode {
    fn name(&self) -> &'static str {
        "OrderedStream"
    }

    fn describe(&self) -> String {
        String::new()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn children(&self) -> Vec<PlanRef> {
        Vec::new()
    }

    fn with_children(&self, _children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        Ok(Arc::new(self.clone()))
    }

    fn sort_fields(&self) -> Option<&[SortField]> {
        Some(&self.fields)
    }

    fn row_iter(&self, _ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        Ok(match self.kind.as_ref() {
            StreamKind::Failing { ok } => Box::new(FailingIter {
                next_id: 0,
                ok: *ok,
            }),
            StreamKind::Counting { step, closes } => Box::new(CountingIter {
                next_id: 0,
                step: *step,
                closes: Arc::clone(closes),
            }),
        })
    }
}

/// Two-child node; the ordering operator below it cannot be diffed
#[derive(Debug, Clone)]
struct UnionNode {
    left: PlanRef,
    right: PlanRef,
}

impl PlanNode for UnionNode {
    fn name(&self) -> &'static str {
        "Union"
    }

    fn describe(&self) -> String {
        String::new()
    }

    fn schema(&self) -> &Schema {
        self.left.schema()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![Arc::clone(&self.left), Arc::clone(&self.right)]
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        let mut children = children.into_iter();
        match (children.next(), children.next()) {
            (Some(left), Some(right)) => Ok(Arc::new(UnionNode { left, right })),
            _ => Err(querydiff::planner::PlannerError::query_invalid(
                "Union expects two children",
            )),
        }
    }

    fn row_iter(&self, _ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        Err(ExecutorError::execution_failed("Union is not executable"))
    }
}

fn sorted(rows: Vec<Row>) -> PlanRef {
    Arc::new(SortNode::new(RowsNode::plan(rows), by_id()))
}

// =============================================================================
// Injection Tests
// =============================================================================

/// Operators above the ordering operator run on the merged stream.
#[test]
fn test_project_above_sort_runs_on_merged_rows() {
    let from: PlanRef = Arc::new(ProjectNode::new(
        sorted(vec![row![2, "b"], row![1, "a"]]),
        vec![1],
    ));
    let to: PlanRef = Arc::new(ProjectNode::new(
        sorted(vec![row![1, "a"], row![2, "z"]]),
        vec![1],
    ));

    let mut differ = QueryDiffer::from_plans(from, to, &DiffConfig::default()).unwrap();
    assert_eq!(
        differ.collect_diffs().unwrap(),
        vec![RowDiff {
            from: Some(row!["b"]),
            to: Some(row!["z"]),
        }]
    );
}

/// A multi-child node on the path hides the ordering operator.
#[test]
fn test_multi_child_path_unsupported() {
    let union = || -> PlanRef {
        Arc::new(UnionNode {
            left: sorted(vec![row![1, "a"]]),
            right: sorted(vec![row![2, "b"]]),
        })
    };

    let err = QueryDiffer::from_plans(union(), union(), &DiffConfig::default()).unwrap_err();
    match err {
        DiffError::Unsupported { reason, plan } => {
            assert!(reason.contains("Union with 2 children"), "{}", reason);
            assert!(plan.contains("Union"));
            assert!(plan.contains("    Rows [count=1]"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Plans ordering rows differently cannot be merged.
#[test]
fn test_mismatched_ordering_unsupported() {
    let to: PlanRef = Arc::new(SortNode::new(
        RowsNode::plan(vec![]),
        vec![SortField::desc(ColumnRef::new(0, "id", DataType::Int))],
    ));
    let err = QueryDiffer::from_plans(sorted(vec![]), to, &DiffConfig::default()).unwrap_err();
    assert!(matches!(err, DiffError::Unsupported { .. }));
}

/// A source failing to start is an execution-start error with the plan.
#[test]
fn test_execution_start_failure() {
    let to: PlanRef = Arc::new(SortNode::new(RowsNode::failing_start(), by_id()));
    let err = QueryDiffer::from_plans(sorted(vec![row![1, "a"]]), to, &DiffConfig::default())
        .unwrap_err();
    match err {
        DiffError::ExecutionStart { side, source, plan } => {
            assert_eq!(side, querydiff::querydiff::Side::To);
            assert_eq!(source.message(), "source offline");
            assert!(plan.contains("Sort [id ASC NULLS FIRST]"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// =============================================================================
// Protocol Tests
// =============================================================================

/// A filter above the ordering operator re-pulls the from side out of turn.
#[test]
fn test_filter_above_sort_is_out_of_order() {
    let filtered = |rows: Vec<Row>| -> PlanRef {
        Arc::new(FilterNode::new(
            sorted(rows),
            vec![Predicate {
                column: ColumnRef::new(0, "id", DataType::Int),
                op: FilterOp::Gt(Value::Int(1)),
            }],
        ))
    };

    let mut differ = QueryDiffer::from_plans(
        filtered(vec![row![1, "a"], row![2, "b"]]),
        filtered(vec![row![1, "a"], row![2, "b"]]),
        &DiffConfig::default(),
    )
    .unwrap();

    let err = differ.next_diff().unwrap_err();
    assert!(err.is_fatal());
    match &err {
        DiffError::Execution(inner) => {
            assert_eq!(inner.code(), ExecutorErrorCode::AeroDiffOutOfOrder)
        }
        other => panic!("unexpected error: {other}"),
    }
    let _ = differ.close();
}

// =============================================================================
// Background Error Tests
// =============================================================================

/// A read failure on one side aborts the diff and is returned again by close.
#[test]
fn test_background_error_surfaces() {
    let from = sorted((1..=5).map(|i| row![i, "x"]).collect());
    let to = OrderedStreamNode::plan(StreamKind::Failing { ok: 2 });

    let mut differ =
        QueryDiffer::from_plans(from, to, &DiffConfig::with_prefetch_capacity(1)).unwrap();

    let err = loop {
        match differ.next_diff() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("diff ended without surfacing the read failure"),
            Err(err) => break err,
        }
    };
    assert_eq!(err.to_string(), "[ERROR] AERO_EXECUTION_FAILED: read failed mid-stream");
    assert!(!err.is_fatal());

    let closed = differ.close().unwrap_err();
    assert_eq!(closed.to_string(), err.to_string());
    // Already closed
    differ.close().unwrap();
}

// =============================================================================
// Cancellation Tests
// =============================================================================

/// Closing mid-stream stops both unbounded workers and closes each source once.
#[test]
fn test_close_mid_stream_stops_workers() {
    let from_closes = Arc::new(AtomicUsize::new(0));
    let to_closes = Arc::new(AtomicUsize::new(0));
    let from = OrderedStreamNode::plan(StreamKind::Counting {
        step: 1,
        closes: Arc::clone(&from_closes),
    });
    let to = OrderedStreamNode::plan(StreamKind::Counting {
        step: 2,
        closes: Arc::clone(&to_closes),
    });

    let mut differ =
        QueryDiffer::from_plans(from, to, &DiffConfig::with_prefetch_capacity(4)).unwrap();

    // Odd ids exist only on the from side
    for expected in [1, 3, 5] {
        let diff = differ.next_diff().unwrap().unwrap();
        assert_eq!(diff.from, Some(row![expected, "x"]));
        assert_eq!(diff.to, None);
    }

    differ.close().unwrap();
    assert_eq!(from_closes.load(Ordering::SeqCst), 1);
    assert_eq!(to_closes.load(Ordering::SeqCst), 1);
}

/// Dropping an open session also stops its workers.
#[test]
fn test_drop_stops_workers() {
    let closes = Arc::new(AtomicUsize::new(0));
    {
        let from = OrderedStreamNode::plan(StreamKind::Counting {
            step: 1,
            closes: Arc::clone(&closes),
        });
        let to = OrderedStreamNode::plan(StreamKind::Counting {
            step: 1,
            closes: Arc::clone(&closes),
        });
        let _differ =
            QueryDiffer::from_plans(from, to, &DiffConfig::with_prefetch_capacity(1)).unwrap();
    }
    // Never started, so each source is closed directly
    assert_eq!(closes.load(Ordering::SeqCst), 2);
}
