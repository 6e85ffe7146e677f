//! Sort key comparison and the sort operator
//!
//! [`RowComparator`] is the single definition of "row order" in the crate:
//! the sort operator orders query output with it and the merge differ aligns
//! the two ordered streams with it. Keeping one comparator guarantees the
//! merge sees exactly the order the query produced.

use std::cmp::Ordering;
use std::collections::VecDeque;

use super::errors::ExecutorResult;
use super::iter::{Fetch, RowIterator};
use crate::planner::{NullOrdering, SortDirection, SortField};
use crate::value::Row;

/// Compares rows by a sort key
#[derive(Debug, Clone)]
pub struct RowComparator {
    fields: Vec<SortField>,
}

impl RowComparator {
    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Compares two rows field by field.
    ///
    /// Per field:
    /// - both null: no signal, next field
    /// - one null: placed by the field's null ordering, whatever the direction
    /// - otherwise the column comparator, operands swapped when descending
    ///
    /// The first non-equal field decides. Rows equal on every field are equal
    /// under the ordering even if other columns differ.
    pub fn compare(&self, left: &Row, right: &Row) -> ExecutorResult<Ordering> {
        for field in &self.fields {
            let lv = field.column.eval(left)?;
            let rv = field.column.eval(right)?;

            match (lv.is_null(), rv.is_null()) {
                (true, true) => continue,
                (true, false) => return Ok(null_side_first(field.nulls)),
                (false, true) => return Ok(null_side_first(field.nulls).reverse()),
                (false, false) => {}
            }

            let (a, b) = match field.direction {
                SortDirection::Ascending => (lv, rv),
                SortDirection::Descending => (rv, lv),
            };

            let ordering = field.column.data_type.compare(a, b)?;
            if ordering != Ordering::Equal {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }

    /// Checks that every key of `row` evaluates and is comparable with its
    /// column type. Rows passing this check are totally ordered.
    pub fn check_keys(&self, row: &Row) -> ExecutorResult<()> {
        for field in &self.fields {
            let value = field.column.eval(row)?;
            if !value.is_null() {
                field.column.data_type.compare(value, value)?;
            }
        }
        Ok(())
    }

    /// Stable in-place sort. Keys are checked up front, so a bad key fails
    /// the sort before any row moves.
    pub fn sort(&self, rows: &mut [Row]) -> ExecutorResult<()> {
        for row in rows.iter() {
            self.check_keys(row)?;
        }
        rows.sort_by(|a, b| self.compare(a, b).unwrap_or(Ordering::Equal));
        Ok(())
    }
}

/// Ordering of (null, non-null) under `nulls`
fn null_side_first(nulls: NullOrdering) -> Ordering {
    match nulls {
        NullOrdering::NullsFirst => Ordering::Less,
        NullOrdering::NullsLast => Ordering::Greater,
    }
}

/// Sort operator: drains its child on first pull, then yields in order.
pub struct SortIter {
    child: Box<dyn RowIterator>,
    comparator: RowComparator,
    sorted: Option<VecDeque<Row>>,
}

impl SortIter {
    pub fn new(child: Box<dyn RowIterator>, comparator: RowComparator) -> Self {
        Self {
            child,
            comparator,
            sorted: None,
        }
    }

    fn materialize(&mut self) -> ExecutorResult<VecDeque<Row>> {
        let mut rows = Vec::new();
        loop {
            match self.child.next()? {
                Fetch::Row(row) => rows.push(row),
                Fetch::Retry => continue,
                Fetch::End => break,
            }
        }
        self.comparator.sort(&mut rows)?;
        Ok(rows.into())
    }
}

impl RowIterator for SortIter {
    fn next(&mut self) -> ExecutorResult<Fetch> {
        if self.sorted.is_none() {
            self.sorted = Some(self.materialize()?);
        }
        Ok(self
            .sorted
            .as_mut()
            .and_then(VecDeque::pop_front)
            .map_or(Fetch::End, Fetch::Row))
    }

    fn close(&mut self) -> ExecutorResult<()> {
        self.sorted = Some(VecDeque::new());
        self.child.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{collect_rows, VecRowIter};
    use crate::planner::ColumnRef;
    use crate::row;
    use crate::value::{DataType, Value};

    fn id() -> ColumnRef {
        ColumnRef::new(0, "id", DataType::Int)
    }

    fn name() -> ColumnRef {
        ColumnRef::new(1, "name", DataType::Text)
    }

    fn null_id() -> Row {
        Row::new(vec![Value::Null, Value::from("n")])
    }

    #[test]
    fn test_ascending_and_descending() {
        let asc = RowComparator::new(vec![SortField::asc(id())]);
        assert_eq!(asc.compare(&row![1, "a"], &row![2, "a"]).unwrap(), Ordering::Less);

        let desc = RowComparator::new(vec![SortField::desc(id())]);
        assert_eq!(desc.compare(&row![1, "a"], &row![2, "a"]).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_nulls_first_regardless_of_direction() {
        for field in [
            SortField::asc(id()).with_nulls(NullOrdering::NullsFirst),
            SortField::desc(id()).with_nulls(NullOrdering::NullsFirst),
        ] {
            let cmp = RowComparator::new(vec![field]);
            assert_eq!(cmp.compare(&null_id(), &row![5, "x"]).unwrap(), Ordering::Less);
            assert_eq!(cmp.compare(&row![5, "x"], &null_id()).unwrap(), Ordering::Greater);
        }
    }

    #[test]
    fn test_nulls_last_regardless_of_direction() {
        for field in [
            SortField::asc(id()).with_nulls(NullOrdering::NullsLast),
            SortField::desc(id()).with_nulls(NullOrdering::NullsLast),
        ] {
            let cmp = RowComparator::new(vec![field]);
            assert_eq!(cmp.compare(&null_id(), &row![5, "x"]).unwrap(), Ordering::Greater);
        }
    }

    #[test]
    fn test_both_null_falls_through_to_next_field() {
        let cmp = RowComparator::new(vec![SortField::asc(id()), SortField::asc(name())]);
        let a = Row::new(vec![Value::Null, Value::from("a")]);
        let b = Row::new(vec![Value::Null, Value::from("b")]);
        assert_eq!(cmp.compare(&a, &b).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_multi_column_tie_is_equal() {
        let cmp = RowComparator::new(vec![SortField::asc(id())]);
        // name differs but is not part of the key
        assert_eq!(cmp.compare(&row![1, "a"], &row![1, "z"]).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_comparison_failure_propagates() {
        let cmp = RowComparator::new(vec![SortField::asc(id())]);
        assert!(cmp.compare(&row!["oops", "a"], &row![1, "a"]).is_err());

        let out_of_range = RowComparator::new(vec![SortField::asc(ColumnRef::new(
            9,
            "ghost",
            DataType::Int,
        ))]);
        assert!(out_of_range.compare(&row![1, "a"], &row![2, "b"]).is_err());
    }

    #[test]
    fn test_sort_iter_orders_rows() {
        let child = VecRowIter::new(vec![row![3, "c"], null_id(), row![1, "a"], row![2, "b"]]);
        let cmp = RowComparator::new(vec![SortField::desc(id())]);
        let mut iter = SortIter::new(Box::new(child), cmp);

        let rows = collect_rows(&mut iter).unwrap();
        assert_eq!(rows, vec![row![3, "c"], row![2, "b"], row![1, "a"], null_id()]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut rows = vec![row![1, "b"], row![1, "a"], row![0, "z"]];
        RowComparator::new(vec![SortField::asc(id())])
            .sort(&mut rows)
            .unwrap();
        assert_eq!(rows, vec![row![0, "z"], row![1, "b"], row![1, "a"]]);
    }

    #[test]
    fn test_sort_surfaces_comparison_error() {
        let mut rows = vec![row![1, "a"], row!["x", "b"]];
        let result = RowComparator::new(vec![SortField::asc(id())]).sort(&mut rows);
        assert!(result.is_err());
    }

    #[test]
    fn test_sort_rejects_bad_key_before_moving_rows() {
        let score = ColumnRef::new(0, "score", DataType::Float);
        let cmp = RowComparator::new(vec![SortField::asc(score)]);

        let mut rows: Vec<Row> = (0..64i32).rev().map(|i| row![f64::from(i), "r"]).collect();
        rows.insert(40, row![f64::NAN, "bad"]);
        let before = format!("{:?}", rows);

        assert!(cmp.sort(&mut rows).is_err());
        assert_eq!(format!("{:?}", rows), before);
    }

    #[test]
    fn test_check_keys() {
        let cmp = RowComparator::new(vec![SortField::asc(id())]);
        assert!(cmp.check_keys(&row![1, "a"]).is_ok());
        assert!(cmp.check_keys(&null_id()).is_ok());
        assert!(cmp.check_keys(&row!["x", "a"]).is_err());
        assert!(cmp.check_keys(&row![]).is_err());
    }
}
