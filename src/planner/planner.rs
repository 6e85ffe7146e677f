//! Query planner
//!
//! Analyzes a parsed [`Query`] against one snapshot and builds its plan:
//!
//! ```text
//! Project? ( Sort? ( Filter? ( Scan ) ) )
//! ```
//!
//! Filters always sit below the sort and there is no row-limiting operator,
//! so every row the sort yields reaches the plan root unchanged.

use std::sync::Arc;

use super::ast::{Condition, OrderTerm, Query, SelectList};
use super::errors::{PlannerError, PlannerResult};
use super::expr::{ColumnRef, Predicate, SortField};
use super::parser::parse_query;
use super::plan::{FilterNode, PlanRef, ProjectNode, ScanNode, SortNode};
use crate::store::{Snapshot, StoreError};
use crate::value::Schema;

/// Plans queries against a single snapshot.
///
/// Planning is deterministic: the same query over the same snapshot yields
/// the same plan.
pub struct QueryPlanner<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> QueryPlanner<'a> {
    /// Creates a new planner
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self { snapshot }
    }

    /// Parses and plans `text`
    pub fn plan_text(&self, text: &str) -> PlannerResult<PlanRef> {
        self.plan(&parse_query(text)?)
    }

    /// Plans a query, returning the plan root or an analysis error.
    pub fn plan(&self, query: &Query) -> PlannerResult<PlanRef> {
        // 1. Resolve the table
        let schema = self
            .snapshot
            .table_schema(&query.table)
            .map_err(|err| match err {
                StoreError::UnknownTable(table) => PlannerError::unknown_table(table),
                other => PlannerError::query_invalid(other.to_string()),
            })?;
        let resolver = Resolver {
            table: &query.table,
            schema: &schema,
        };

        // 2. Resolve everything before building nodes
        let predicates = query
            .conditions
            .iter()
            .map(|c| resolver.predicate(c))
            .collect::<PlannerResult<Vec<_>>>()?;
        let sort_fields = query
            .order_by
            .iter()
            .map(|t| resolver.sort_field(t))
            .collect::<PlannerResult<Vec<_>>>()?;
        let projection = match &query.select {
            SelectList::All => None,
            SelectList::Columns(columns) if columns.is_empty() => {
                return Err(PlannerError::query_invalid("empty select list"));
            }
            SelectList::Columns(columns) => Some(
                columns
                    .iter()
                    .map(|c| resolver.column(c).map(|r| r.index))
                    .collect::<PlannerResult<Vec<_>>>()?,
            ),
        };

        // 3. Build bottom-up
        let mut root: PlanRef = Arc::new(ScanNode::new(
            query.table.clone(),
            schema.clone(),
            self.snapshot.clone(),
        ));
        if !predicates.is_empty() {
            root = Arc::new(FilterNode::new(root, predicates));
        }
        if !sort_fields.is_empty() {
            root = Arc::new(SortNode::new(root, sort_fields));
        }
        if let Some(indices) = projection {
            root = Arc::new(ProjectNode::new(root, indices));
        }

        Ok(root)
    }
}

struct Resolver<'q> {
    table: &'q str,
    schema: &'q Schema,
}

impl Resolver<'_> {
    fn column(&self, name: &str) -> PlannerResult<ColumnRef> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| PlannerError::unknown_column(self.table, name))?;
        let column = &self.schema.columns()[index];
        Ok(ColumnRef::new(index, column.name.clone(), column.data_type))
    }

    fn predicate(&self, condition: &Condition) -> PlannerResult<Predicate> {
        let column = self.column(&condition.column)?;
        if let Some(operand) = condition.op.operand() {
            column
                .data_type
                .check(operand)
                .map_err(|err| PlannerError::type_mismatch(&column.name, err))?;
        }
        Ok(Predicate {
            column,
            op: condition.op.clone(),
        })
    }

    fn sort_field(&self, term: &OrderTerm) -> PlannerResult<SortField> {
        Ok(SortField {
            column: self.column(&term.column)?,
            direction: term.direction,
            nulls: term.effective_nulls(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{collect_rows, ExecContext};
    use crate::planner::{NullOrdering, PlannerErrorCode, SortDirection};
    use crate::row;
    use crate::store::{Database, WriteBatch};
    use crate::value::{Column, DataType};

    fn snapshot() -> Snapshot {
        let db = Database::new();
        db.create_table(
            "users",
            Schema::new([
                Column::required("id", DataType::Int),
                Column::new("name", DataType::Text),
                Column::new("score", DataType::Float),
            ]),
            0,
        )
        .unwrap();
        db.commit(
            WriteBatch::new()
                .put("users", row![1, "ann", 2.5])
                .put("users", row![2, "bob", None::<f64>])
                .put("users", row![3, "cat", 9.0]),
            "seed",
        )
        .unwrap();
        db.snapshot().unwrap()
    }

    fn shape(plan: &PlanRef) -> Vec<&'static str> {
        let mut names = vec![plan.name()];
        let mut children = plan.children();
        while let Some(child) = children.pop() {
            names.push(child.name());
            children = child.children();
        }
        names
    }

    #[test]
    fn test_full_plan_shape() {
        let snapshot = snapshot();
        let planner = QueryPlanner::new(&snapshot);
        let plan = planner
            .plan_text("SELECT name FROM users WHERE id > 1 ORDER BY score DESC")
            .unwrap();
        assert_eq!(shape(&plan), vec!["Project", "Sort", "Filter", "Scan"]);
    }

    #[test]
    fn test_minimal_plan_is_scan() {
        let snapshot = snapshot();
        let plan = QueryPlanner::new(&snapshot)
            .plan(&Query::new("users"))
            .unwrap();
        assert_eq!(shape(&plan), vec!["Scan"]);
        assert_eq!(plan.schema().len(), 3);
    }

    #[test]
    fn test_sort_fields_get_default_nulls() {
        let snapshot = snapshot();
        let plan = QueryPlanner::new(&snapshot)
            .plan_text("SELECT * FROM users ORDER BY score DESC, id")
            .unwrap();
        let fields = plan.sort_fields().unwrap();
        assert_eq!(fields[0].direction, SortDirection::Descending);
        assert_eq!(fields[0].nulls, NullOrdering::NullsLast);
        assert_eq!(fields[1].nulls, NullOrdering::NullsFirst);
        assert_eq!(fields[1].column.index, 0);
    }

    #[test]
    fn test_plan_executes_in_order() {
        let snapshot = snapshot();
        let plan = QueryPlanner::new(&snapshot)
            .plan_text("SELECT id FROM users ORDER BY score DESC NULLS FIRST")
            .unwrap();
        let mut iter = plan.row_iter(&ExecContext::new("test")).unwrap();
        assert_eq!(
            collect_rows(&mut iter).unwrap(),
            vec![row![2], row![3], row![1]]
        );
    }

    #[test]
    fn test_unknown_table_rejected() {
        let snapshot = snapshot();
        let err = QueryPlanner::new(&snapshot)
            .plan_text("SELECT * FROM ghosts")
            .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::AeroUnknownTable);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let snapshot = snapshot();
        let planner = QueryPlanner::new(&snapshot);
        for text in [
            "SELECT age FROM users",
            "SELECT * FROM users WHERE age = 1",
            "SELECT * FROM users ORDER BY age",
        ] {
            let err = planner.plan_text(text).unwrap_err();
            assert_eq!(err.code(), PlannerErrorCode::AeroUnknownColumn, "{}", text);
        }
    }

    #[test]
    fn test_literal_type_checked() {
        let snapshot = snapshot();
        let planner = QueryPlanner::new(&snapshot);

        let err = planner
            .plan_text("SELECT * FROM users WHERE id = 'one'")
            .unwrap_err();
        assert_eq!(err.code(), PlannerErrorCode::AeroQueryTypeMismatch);

        // Int literals are accepted by Float columns
        assert!(planner
            .plan_text("SELECT * FROM users WHERE score > 1")
            .is_ok());
    }

    #[test]
    fn test_deterministic_planning() {
        let snapshot = snapshot();
        let planner = QueryPlanner::new(&snapshot);
        let text = "SELECT id, name FROM users WHERE name != 'x' ORDER BY name";

        let first = crate::planner::render_plan(planner.plan_text(text).unwrap().as_ref());
        let second = crate::planner::render_plan(planner.plan_text(text).unwrap().as_ref());
        assert_eq!(first, second);
    }
}
