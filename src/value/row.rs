//! Rows and schemas

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{ValueError, ValueResult};
use super::types::{DataType, Value};

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Column type
    pub data_type: DataType,
    /// Whether the column admits `Null`
    pub nullable: bool,
}

impl Column {
    /// Creates a nullable column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Creates a non-nullable column
    pub fn required(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            nullable: false,
            ..Self::new(name, data_type)
        }
    }
}

/// Ordered column list shared by every row of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Arc<[Column]>,
}

impl Schema {
    /// Creates a schema from columns in order
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// Returns the columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column at `index`
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Finds a column position by name (case-insensitive)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Builds the schema of a projection over `indices`
    pub fn project(&self, indices: &[usize]) -> Self {
        Self::new(indices.iter().filter_map(|&i| self.column(i).cloned()))
    }

    /// Validates a row against this schema: width, types, nullability
    pub fn validate(&self, row: &Row) -> ValueResult<()> {
        if row.len() != self.len() {
            return Err(ValueError::ArityMismatch {
                expected: self.len(),
                actual: row.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(row.values()) {
            if value.is_null() && !column.nullable {
                return Err(ValueError::NotNullable(column.name.clone()));
            }
            column.data_type.check(value)?;
        }
        Ok(())
    }
}

/// An ordered sequence of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row(Vec<Value>);

impl Row {
    /// Creates a row from values in column order
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the value at `index`
    pub fn get(&self, index: usize) -> ValueResult<&Value> {
        self.0.get(index).ok_or(ValueError::ColumnOutOfRange {
            index,
            len: self.0.len(),
        })
    }

    /// Returns the values
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Returns the number of values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row has no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the row, returning its values
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Full-row equality under `schema`.
    ///
    /// Each column is compared with its own type's equality; two nulls are
    /// equal, as are two NaNs.
    /// Rows whose width differs from the schema are an error, not inequality.
    pub fn equals(&self, other: &Row, schema: &Schema) -> ValueResult<bool> {
        for row in [self, other] {
            if row.len() != schema.len() {
                return Err(ValueError::ArityMismatch {
                    expected: schema.len(),
                    actual: row.len(),
                });
            }
        }

        for ((a, b), column) in self.0.iter().zip(&other.0).zip(schema.columns()) {
            let equal = match (a.is_null(), b.is_null()) {
                (true, true) => true,
                (false, false) => column.data_type.value_eq(a, b)?,
                _ => false,
            };
            if !equal {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

/// Builds a [`Row`] from a list of expressions convertible into [`Value`].
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::value::Row::new(vec![$($crate::value::Value::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new([
            Column::required("id", DataType::Int),
            Column::new("name", DataType::Text),
        ])
    }

    #[test]
    fn test_index_of_is_case_insensitive() {
        let s = schema();
        assert_eq!(s.index_of("ID"), Some(0));
        assert_eq!(s.index_of("name"), Some(1));
        assert_eq!(s.index_of("missing"), None);
    }

    #[test]
    fn test_equals_compares_every_column() {
        let s = schema();
        assert!(row![1, "a"].equals(&row![1, "a"], &s).unwrap());
        assert!(!row![1, "a"].equals(&row![1, "A"], &s).unwrap());
        assert!(!row![1, "a"].equals(&row![2, "a"], &s).unwrap());
    }

    #[test]
    fn test_equals_null_handling() {
        let s = schema();
        let null_name = Row::new(vec![Value::Int(1), Value::Null]);
        assert!(null_name.equals(&null_name.clone(), &s).unwrap());
        assert!(!null_name.equals(&row![1, "a"], &s).unwrap());
    }

    #[test]
    fn test_equals_nan_outside_key() {
        let s = Schema::new([
            Column::required("id", DataType::Int),
            Column::new("score", DataType::Float),
        ]);
        let nan = row![1, f64::NAN];
        assert!(nan.equals(&nan.clone(), &s).unwrap());
        assert!(!nan.equals(&row![1, 0.5], &s).unwrap());
    }

    #[test]
    fn test_equals_rejects_wrong_width() {
        let s = schema();
        let err = row![1].equals(&row![1, "a"], &s).unwrap_err();
        assert!(matches!(err, ValueError::ArityMismatch { .. }));
    }

    #[test]
    fn test_validate() {
        let s = schema();
        assert!(s.validate(&row![1, "a"]).is_ok());
        assert!(s.validate(&Row::new(vec![Value::Int(1), Value::Null])).is_ok());
        assert_eq!(
            s.validate(&Row::new(vec![Value::Null, Value::Null])),
            Err(ValueError::NotNullable("id".into()))
        );
        assert!(s.validate(&row!["x", "a"]).is_err());
    }

    #[test]
    fn test_project_schema() {
        let s = schema().project(&[1]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.columns()[0].name, "name");
    }

    #[test]
    fn test_row_display() {
        assert_eq!(row![2, "b"].to_string(), "(2, 'b')");
        assert!(row![1].get(3).is_err());
    }
}
