//! Physical plan nodes
//!
//! A plan is an immutable tree of [`PlanNode`]s shared through [`PlanRef`].
//! Nodes expose their children and can be rebuilt with replacement children,
//! which lets callers splice synthetic operators into an analyzed plan.

use std::fmt;
use std::sync::Arc;

use super::errors::{PlannerError, PlannerResult};
use super::expr::{Predicate, SortField};
use crate::executor::{
    ExecContext, ExecutorError, ExecutorResult, FilterIter, ProjectIter, RowComparator,
    RowIterator, SortIter,
};
use crate::store::Snapshot;
use crate::value::Schema;

/// Shared handle to a plan node
pub type PlanRef = Arc<dyn PlanNode>;

/// A node of an executable plan
pub trait PlanNode: fmt::Debug + Send + Sync {
    /// Operator name, e.g. `"Sort"`
    fn name(&self) -> &'static str;

    /// Operator arguments for explain output
    fn describe(&self) -> String;

    /// Schema of the rows this node produces
    fn schema(&self) -> &Schema;

    /// Child nodes, in order
    fn children(&self) -> Vec<PlanRef>;

    /// Returns a copy of this node with `children` substituted
    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef>;

    /// Sort key when this node establishes the output order
    fn sort_fields(&self) -> Option<&[SortField]> {
        None
    }

    /// Starts executing the subtree rooted here
    fn row_iter(&self, ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>>;
}

fn single_child(node: &str, mut children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
    match children.len() {
        1 => Ok(children.remove(0)),
        n => Err(PlannerError::query_invalid(format!(
            "{} expects exactly one child, got {}",
            node, n
        ))),
    }
}

/// Streams a table from a snapshot in primary key order
#[derive(Clone)]
pub struct ScanNode {
    table: String,
    schema: Schema,
    snapshot: Snapshot,
}

impl ScanNode {
    pub fn new(table: impl Into<String>, schema: Schema, snapshot: Snapshot) -> Self {
        Self {
            table: table.into(),
            schema,
            snapshot,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Debug for ScanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanNode")
            .field("table", &self.table)
            .field("commit", &self.snapshot.commit_id())
            .finish()
    }
}

impl PlanNode for ScanNode {
    fn name(&self) -> &'static str {
        "Scan"
    }

    fn describe(&self) -> String {
        format!("table={} as_of={}", self.table, self.snapshot.commit_id())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn children(&self) -> Vec<PlanRef> {
        Vec::new()
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        if !children.is_empty() {
            return Err(PlannerError::query_invalid("Scan takes no children"));
        }
        Ok(Arc::new(self.clone()))
    }

    fn row_iter(&self, _ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        let scan = self
            .snapshot
            .scan(&self.table)
            .map_err(|err| ExecutorError::execution_failed(err.to_string()))?;
        Ok(Box::new(scan))
    }
}

/// Drops rows failing any predicate
#[derive(Debug, Clone)]
pub struct FilterNode {
    child: PlanRef,
    predicates: Vec<Predicate>,
}

impl FilterNode {
    pub fn new(child: PlanRef, predicates: Vec<Predicate>) -> Self {
        Self { child, predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl PlanNode for FilterNode {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn describe(&self) -> String {
        self.predicates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.child.clone()]
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        Ok(Arc::new(Self {
            child: single_child(self.name(), children)?,
            predicates: self.predicates.clone(),
        }))
    }

    fn row_iter(&self, ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        let child = self.child.row_iter(ctx)?;
        Ok(Box::new(FilterIter::new(child, self.predicates.clone())))
    }
}

/// Orders its input; the plan's ordering operator
#[derive(Debug, Clone)]
pub struct SortNode {
    child: PlanRef,
    fields: Vec<SortField>,
}

impl SortNode {
    pub fn new(child: PlanRef, fields: Vec<SortField>) -> Self {
        Self { child, fields }
    }
}

impl PlanNode for SortNode {
    fn name(&self) -> &'static str {
        "Sort"
    }

    fn describe(&self) -> String {
        self.fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.child.clone()]
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        Ok(Arc::new(Self {
            child: single_child(self.name(), children)?,
            fields: self.fields.clone(),
        }))
    }

    fn sort_fields(&self) -> Option<&[SortField]> {
        Some(&self.fields)
    }

    fn row_iter(&self, ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        let child = self.child.row_iter(ctx)?;
        let comparator = RowComparator::new(self.fields.clone());
        Ok(Box::new(SortIter::new(child, comparator)))
    }
}

/// Keeps a subset of columns
#[derive(Debug, Clone)]
pub struct ProjectNode {
    child: PlanRef,
    indices: Vec<usize>,
    schema: Schema,
}

impl ProjectNode {
    pub fn new(child: PlanRef, indices: Vec<usize>) -> Self {
        let schema = child.schema().project(&indices);
        Self {
            child,
            indices,
            schema,
        }
    }
}

impl PlanNode for ProjectNode {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn describe(&self) -> String {
        self.schema
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.child.clone()]
    }

    fn with_children(&self, children: Vec<PlanRef>) -> PlannerResult<PlanRef> {
        Ok(Arc::new(Self {
            child: single_child(self.name(), children)?,
            indices: self.indices.clone(),
            schema: self.schema.clone(),
        }))
    }

    fn row_iter(&self, ctx: &ExecContext) -> ExecutorResult<Box<dyn RowIterator>> {
        let child = self.child.row_iter(ctx)?;
        Ok(Box::new(ProjectIter::new(child, self.indices.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::collect_rows;
    use crate::planner::expr::{ColumnRef, FilterOp};
    use crate::row;
    use crate::store::{Database, WriteBatch};
    use crate::value::{Column, DataType, Value};

    fn scan() -> PlanRef {
        let db = Database::new();
        let schema = Schema::new([
            Column::required("id", DataType::Int),
            Column::new("name", DataType::Text),
        ]);
        db.create_table("t", schema.clone(), 0).unwrap();
        db.commit(
            WriteBatch::new()
                .put("t", row![2, "b"])
                .put("t", row![1, "a"])
                .put("t", row![3, "c"]),
            "seed",
        )
        .unwrap();
        Arc::new(ScanNode::new("t", schema, db.snapshot().unwrap()))
    }

    fn id() -> ColumnRef {
        ColumnRef::new(0, "id", DataType::Int)
    }

    #[test]
    fn test_pipeline_executes() {
        let filter: PlanRef = Arc::new(FilterNode::new(
            scan(),
            vec![Predicate {
                column: id(),
                op: FilterOp::Ne(Value::Int(2)),
            }],
        ));
        let sort: PlanRef = Arc::new(SortNode::new(filter, vec![SortField::desc(id())]));
        let project = ProjectNode::new(sort, vec![1]);

        assert_eq!(project.schema().columns()[0].name, "name");
        let mut iter = project.row_iter(&ExecContext::new("test")).unwrap();
        assert_eq!(collect_rows(&mut iter).unwrap(), vec![row!["c"], row!["a"]]);
    }

    #[test]
    fn test_only_sort_exposes_sort_fields() {
        let scan = scan();
        assert!(scan.sort_fields().is_none());
        let sort = SortNode::new(scan, vec![SortField::asc(id())]);
        assert_eq!(sort.sort_fields().map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_with_children_replaces_child() {
        let sort = SortNode::new(scan(), vec![SortField::asc(id())]);
        let other = scan();
        let rebuilt = sort.with_children(vec![other.clone()]).unwrap();
        assert!(Arc::ptr_eq(&rebuilt.children()[0], &other));
        assert_eq!(rebuilt.describe(), "id ASC NULLS FIRST");
    }

    #[test]
    fn test_with_children_checks_arity() {
        let sort = SortNode::new(scan(), vec![SortField::asc(id())]);
        assert!(sort.with_children(vec![]).is_err());
        assert!(sort.with_children(vec![scan(), scan()]).is_err());
        assert!(scan().with_children(vec![scan()]).is_err());
    }
}
