//! Planner error types
//!
//! Error codes:
//! - AERO_QUERY_PARSE (REJECT)
//! - AERO_QUERY_INVALID (REJECT)
//! - AERO_UNKNOWN_TABLE (REJECT)
//! - AERO_UNKNOWN_COLUMN (REJECT)
//! - AERO_QUERY_TYPE_MISMATCH (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Query text is not valid syntax
    AeroQueryParse,
    /// Malformed plan or query structure
    AeroQueryInvalid,
    /// Table not present in the snapshot
    AeroUnknownTable,
    /// Column not present in the table
    AeroUnknownColumn,
    /// Literal cannot be compared with the column's type
    AeroQueryTypeMismatch,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::AeroQueryParse => "AERO_QUERY_PARSE",
            PlannerErrorCode::AeroQueryInvalid => "AERO_QUERY_INVALID",
            PlannerErrorCode::AeroUnknownTable => "AERO_UNKNOWN_TABLE",
            PlannerErrorCode::AeroUnknownColumn => "AERO_UNKNOWN_COLUMN",
            PlannerErrorCode::AeroQueryTypeMismatch => "AERO_QUERY_TYPE_MISMATCH",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// Byte offset into the query text, for parse errors
    position: Option<usize>,
}

impl PlannerError {
    /// Create a parse error at `position`
    pub fn parse(position: usize, reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryParse,
            message: reason.into(),
            position: Some(position),
        }
    }

    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryInvalid,
            message: reason.into(),
            position: None,
        }
    }

    /// Create an unknown table error
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroUnknownTable,
            message: format!("Table '{}' not found", table.into()),
            position: None,
        }
    }

    /// Create an unknown column error
    pub fn unknown_column(table: &str, column: &str) -> Self {
        Self {
            code: PlannerErrorCode::AeroUnknownColumn,
            message: format!("Column '{}' not found in table '{}'", column, table),
            position: None,
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(column: &str, reason: impl fmt::Display) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryTypeMismatch,
            message: format!("Column '{}': {}", column, reason),
            position: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the byte offset of a parse error
    pub fn position(&self) -> Option<usize> {
        self.position
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(position) = self.position {
            write!(f, " (at byte {})", position)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerErrorCode::AeroQueryParse.code(), "AERO_QUERY_PARSE");
        assert_eq!(PlannerErrorCode::AeroUnknownTable.code(), "AERO_UNKNOWN_TABLE");
        assert_eq!(
            PlannerErrorCode::AeroUnknownColumn.code(),
            "AERO_UNKNOWN_COLUMN"
        );
    }

    #[test]
    fn test_error_display() {
        let err = PlannerError::unknown_column("users", "age");
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("AERO_UNKNOWN_COLUMN"));
        assert!(display.contains("age"));

        let err = PlannerError::parse(7, "expected FROM");
        assert!(err.to_string().ends_with("(at byte 7)"));
    }
}
