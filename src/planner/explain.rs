//! Explain plan output
//!
//! Produces deterministic, human-readable plan descriptions. Setup errors
//! that concern a specific plan carry this rendering for diagnostics.

use std::fmt;

use super::errors::PlannerError;
use super::plan::PlanNode;

/// One operator line of an explain plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainLine {
    /// Nesting depth, root is 0
    pub depth: usize,
    /// Operator name
    pub name: String,
    /// Operator arguments
    pub detail: String,
}

/// Explain plan output
#[derive(Debug, Clone)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Operators in pre-order
    pub lines: Vec<ExplainLine>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a plan tree
    pub fn from_plan(plan: &dyn PlanNode) -> Self {
        let mut lines = Vec::new();
        collect(plan, 0, &mut lines);
        Self {
            accepted: true,
            lines,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            lines: Vec::new(),
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

fn collect(node: &dyn PlanNode, depth: usize, lines: &mut Vec<ExplainLine>) {
    lines.push(ExplainLine {
        depth,
        name: node.name().to_string(),
        detail: node.describe(),
    });
    for child in node.children() {
        collect(child.as_ref(), depth + 1, lines);
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            for line in &self.lines {
                write!(f, "{:indent$}{}", "", line.name, indent = line.depth * 2)?;
                if line.detail.is_empty() {
                    writeln!(f)?;
                } else {
                    writeln!(f, " [{}]", line.detail)?;
                }
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}

/// Renders `plan` as an indented operator tree
pub fn render_plan(plan: &dyn PlanNode) -> String {
    ExplainPlan::from_plan(plan).to_string()
}
