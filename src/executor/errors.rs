//! Executor error types
//!
//! Error codes:
//! - AERO_EXECUTION_FAILED (ERROR)
//! - AERO_EVALUATION_FAILED (ERROR)
//! - AERO_WORKER_FAILED (ERROR)
//! - AERO_DIFF_OUT_OF_ORDER (FATAL)
//! - AERO_DIFF_NULL_ROW (FATAL)

use std::fmt;

use crate::value::ValueError;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed; the data or the source is at fault
    Error,
    /// Broken integration; never retried
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Executor-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// General execution failure (source read, operator misuse)
    AeroExecutionFailed,
    /// Sort key or predicate evaluation/comparison failed
    AeroEvaluationFailed,
    /// Background prefetch worker could not run to completion
    AeroWorkerFailed,
    /// Merge differ entry points called out of order (FATAL)
    AeroDiffOutOfOrder,
    /// Merge differ asked to compare a missing row (FATAL)
    AeroDiffNullRow,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::AeroExecutionFailed => "AERO_EXECUTION_FAILED",
            ExecutorErrorCode::AeroEvaluationFailed => "AERO_EVALUATION_FAILED",
            ExecutorErrorCode::AeroWorkerFailed => "AERO_WORKER_FAILED",
            ExecutorErrorCode::AeroDiffOutOfOrder => "AERO_DIFF_OUT_OF_ORDER",
            ExecutorErrorCode::AeroDiffNullRow => "AERO_DIFF_NULL_ROW",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::AeroDiffOutOfOrder | ExecutorErrorCode::AeroDiffNullRow => {
                Severity::Fatal
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
}

impl ExecutorError {
    /// Create an execution failed error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroExecutionFailed,
            message: reason.into(),
        }
    }

    /// Create an evaluation failed error
    pub fn evaluation_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroEvaluationFailed,
            message: reason.into(),
        }
    }

    /// Create a worker failure error
    pub fn worker_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::AeroWorkerFailed,
            message: reason.into(),
        }
    }

    /// Create an out-of-order protocol error (FATAL)
    pub fn out_of_order(side: impl fmt::Display) -> Self {
        Self {
            code: ExecutorErrorCode::AeroDiffOutOfOrder,
            message: format!("query diff iterators called out of order ({} side)", side),
        }
    }

    /// Create a missing-row comparison error (FATAL)
    pub fn null_row() -> Self {
        Self {
            code: ExecutorErrorCode::AeroDiffNullRow,
            message: "missing rows cannot be compared".into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
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

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

impl From<ValueError> for ExecutorError {
    fn from(err: ValueError) -> Self {
        Self::evaluation_failed(err.to_string())
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
