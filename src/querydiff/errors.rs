//! Query diff errors

use thiserror::Error;

use super::merge::Side;
use crate::executor::ExecutorError;
use crate::planner::PlannerError;

/// Errors raised while setting up or running a diff session
#[derive(Debug, Clone, Error)]
pub enum DiffError {
    #[error("cannot parse diff query: {0}")]
    Parse(#[source] PlannerError),

    #[error("error analyzing query on {side} snapshot: {source}")]
    Analysis {
        side: Side,
        #[source]
        source: PlannerError,
    },

    /// No usable ordering operator; `plan` is the rendered plan
    #[error("cannot diff query: {reason}\n{plan}")]
    Unsupported { reason: String, plan: String },

    #[error("cannot start {side} execution: {source}\n{plan}")]
    ExecutionStart {
        side: Side,
        #[source]
        source: ExecutorError,
        plan: String,
    },

    #[error(transparent)]
    Execution(#[from] ExecutorError),

    #[error("invalid diff configuration: {0}")]
    Config(String),
}

impl DiffError {
    /// Returns true for integration faults that must never be retried
    pub fn is_fatal(&self) -> bool {
        match self {
            DiffError::Execution(err) | DiffError::ExecutionStart { source: err, .. } => {
                err.is_fatal()
            }
            _ => false,
        }
    }
}

/// Result type for diff operations
pub type DiffResult<T> = Result<T, DiffError>;
