//! Plan injection
//!
//! Finds the ordering operator of an analyzed plan and replaces it with a
//! synthetic leaf whose rows come from the shared [`MergeDiffer`]. Operators
//! above the ordering operator run unchanged on the merged stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::errors::{DiffError, DiffResult};
use super::merge::{MergeDiffer, Side};
use crate::executor::{ExecContext, ExecutorError, ExecutorResult, Fetch, RowIterator};
use crate::planner::{render_plan, PlanNode, PlanRef, PlannerError, PlannerResult};
use crate::value::Schema;

/// Merge differ shared by the two synthetic operators of one session
pub type SharedMerge = Arc<Mutex<MergeDiffer>>;

/// Locates the ordering operator by walking single-child links from `root`.
///
/// A plan without one, or one reachable only through a multi-child node,
/// cannot be diffed; the error carries the rendered plan.
pub fn find_ordering(root: &PlanRef) -> DiffResult<PlanRef> {
    visit(root).map_err(|reason| DiffError::Unsupported {
        reason,
        plan: render_plan(root.as_ref()),
    })
}

fn visit(node: &PlanRef) -> Result<PlanRef, String> {
    if node.sort_fields().is_some() {
        return Ok(Arc::clone(node));
    }
    match node.children().as_slice() {
        [] => Err("query plan does not contain a sort node".to_string()),
        [child] => visit(child),
        children => Err(format!(
            "sort node is only reachable through {} with {} children",
            node.name(),
            children.len()
        )),
    }
}

/// Rebuilds `node` with its ordering operator replaced by `replacement`
pub fn splice(node: &PlanRef, replacement: &PlanRef) -> PlannerResult<PlanRef> {
    if node.sort_fields().is_some() {
        return Ok(Arc::clone(replacement));
    }
    match node.children().as_slice() {
        [child] => node.with_children(vec![splice(child, replacement)?]),
        _ => Err(PlannerError::query_invalid(
            "no sort node on the single-child path",
        )),
    }
}

/// Synthetic leaf standing in for one side's ordering operator
#[derive(Clone)]
pub struct DiffSourceNode {
    side: Side,
    schema: Schema,
    merge: SharedMerge,
    executed: Arc<AtomicBool>,
}

impl DiffSourceNode {
    pub fn new(side: Side, schema: Schema, merge: SharedMerge) -> Self {
        Self {
            side,
            schema,
            merge,
            executed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

impl fmt::Debug for DiffSourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffSourceNode")
            .field("side", &self.side)
            .finish_non_exhaustive()
    }
}

impl PlanNode for DiffSourceNode {
    fn name(&self) -> &'static str {
        "DiffSource"
    }

    fn describe(&self) -> String {
        format!("side={}", self.side)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn children(&self) -> Vec<PlanRef> {
        Vec::new()
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        if !children.is_empty() {
            return Err(PlannerError::query_invalid("DiffSource takes no children"));
        }
        Ok(Arc::new(self.clone()))
    }

    /// The merged stream is single-pass; a second execution is refused
    fn row_iter(&self, ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        if self.executed.swap(true, Ordering::AcqRel) {
            return Err(ExecutorError::execution_failed(format!(
                "{} diff source already executed",
                self.side
            )));
        }
        debug!(side = %self.side, context = ctx.label(), "diff source opened");
        Ok(Box::new(DiffSideIter {
            side: self.side,
            merge: Arc::clone(&self.merge),
            closed: false,
        }))
    }
}

/// One side's view of the merged stream
struct DiffSideIter {
    side: Side,
    merge: SharedMerge,
    closed: bool,
}

impl DiffSideIter {
    fn with_merge<T>(
        &self,
        f: impl FnOnce(&mut MergeDiffer) -> ExecutorResult<T>,
    ) -> ExecutorResult<T> {
        let mut merge = self
            .merge
            .lock()
            .map_err(|_| ExecutorError::execution_failed("query diff merge state poisoned"))?;
        f(&mut merge)
    }
}

impl RowIterator for DiffSideIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        if self.closed {
            return Ok(Fetch::End);
        }
        let side = self.side;
        self.with_merge(|merge| merge.next_row(side))
    }

    fn close(&mut self) -> ExecutorResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let side = self.side;
        self.with_merge(|merge| merge.close_side(side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{RowComparator, VecRowIter};
    use crate::planner::{ColumnRef, ProjectNode, QueryPlanner, ScanNode, SortField, SortNode};
    use crate::querydiff::DiffConfig;
    use crate::row;
    use crate::store::{Database, WriteBatch};
    use crate::value::{Column, DataType};

    fn scan() -> PlanRef {
        let db = Database::new();
        let schema = Schema::new([Column::required("id", DataType::Int)]);
        db.create_table("t", schema.clone(), 0).unwrap();
        db.commit(WriteBatch::new().put("t", row![1]), "seed").unwrap();
        Arc::new(ScanNode::new("t", schema, db.snapshot().unwrap()))
    }

    fn sorted(child: PlanRef) -> PlanRef {
        Arc::new(SortNode::new(
            child,
            vec![SortField::asc(ColumnRef::new(0, "id", DataType::Int))],
        ))
    }

    fn shared_merge() -> SharedMerge {
        Arc::new(Mutex::new(MergeDiffer::new(
            Box::new(VecRowIter::new(vec![row![1]])),
            Box::new(VecRowIter::new(vec![row![2]])),
            RowComparator::new(vec![SortField::asc(ColumnRef::new(
                0,
                "id",
                DataType::Int,
            ))]),
            &DiffConfig::default(),
        )))
    }

    #[test]
    fn test_find_ordering_through_single_children() {
        let sort = sorted(scan());
        let root: PlanRef = Arc::new(ProjectNode::new(Arc::clone(&sort), vec![0]));
        let found = find_ordering(&root).unwrap();
        assert!(Arc::ptr_eq(&found, &sort));
    }

    #[test]
    fn test_missing_sort_is_unsupported() {
        let err = find_ordering(&scan()).unwrap_err();
        match err {
            DiffError::Unsupported { reason, plan } => {
                assert!(reason.contains("does not contain a sort node"));
                assert!(plan.contains("Scan [table=t"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_planned_query_injects() {
        let db = Database::new();
        db.create_table(
            "t",
            Schema::new([
                Column::required("id", DataType::Int),
                Column::new("v", DataType::Text),
            ]),
            0,
        )
        .unwrap();
        let snapshot = db.snapshot().unwrap();
        let plan = QueryPlanner::new(&snapshot)
            .plan_text("SELECT v FROM t ORDER BY id")
            .unwrap();

        let sort = find_ordering(&plan).unwrap();
        let source: PlanRef = Arc::new(DiffSourceNode::new(
            Side::From,
            sort.schema().clone(),
            shared_merge(),
        ));
        let spliced = splice(&plan, &source).unwrap();

        let rendered = render_plan(spliced.as_ref());
        assert!(rendered.contains("Project [v]"));
        assert!(rendered.contains("DiffSource [side=from]"));
        assert!(!rendered.contains("Sort"));
    }

    #[test]
    fn test_diff_source_executes_once() {
        let merge = shared_merge();
        let schema = Schema::new([Column::required("id", DataType::Int)]);
        let from = DiffSourceNode::new(Side::From, schema.clone(), Arc::clone(&merge));
        let to = DiffSourceNode::new(Side::To, schema, Arc::clone(&merge));

        let ctx = ExecContext::new("test");
        let mut from_iter = from.row_iter(&ctx).unwrap();
        let mut to_iter = to.row_iter(&ctx).unwrap();
        assert!(from.row_iter(&ctx).is_err());

        assert_eq!(from_iter.next().unwrap(), Fetch::Row(row![1]));
        assert_eq!(to_iter.next().unwrap(), Fetch::Retry);
        assert_eq!(from_iter.next().unwrap(), Fetch::End);
        assert_eq!(to_iter.next().unwrap(), Fetch::Row(row![2]));

        from_iter.close().unwrap();
        to_iter.close().unwrap();
        to_iter.close().unwrap();
        assert_eq!(to_iter.next().unwrap(), Fetch::End);
    }
}
