//! Cross-field numeric comparisons.

use crate::core::error::StageResult;
use crate::core::outcome::{ErrorRecord, Severity, ValidationOutcome};
use crate::core::types::Record;
use crate::validation::stages::ValidationStage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator between two numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl Comparison {
    /// Evaluate `left <op> right`.
    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Limit validation - compares one numeric field against another.
///
/// The record is attached to the left field. If either side is missing or not
/// numeric the comparison is skipped. Does not halt by default.
#[derive(Debug, Clone)]
pub struct FieldComparison {
    name: String,
    left: String,
    op: Comparison,
    right: String,
    severity: Severity,
    message: Option<String>,
    halts: bool,
}

impl FieldComparison {
    /// Require `left <op> right`.
    pub fn new(left: impl Into<String>, op: Comparison, right: impl Into<String>) -> Self {
        let left = left.into();
        let right = right.into();
        Self {
            name: format!("{} {} {}", left, op, right),
            left,
            op,
            right,
            severity: Severity::Error,
            message: None,
            halts: false,
        }
    }

    /// Override the stage name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Severity of the reported record.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Replace the generated message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the halt policy.
    pub fn with_halt(mut self, halts: bool) -> Self {
        self.halts = halts;
        self
    }
}

impl ValidationStage<Record> for FieldComparison {
    fn name(&self) -> &str {
        &self.name
    }

    fn halts_on_failure(&self) -> bool {
        self.halts
    }

    fn check(&self, record: &Record) -> StageResult<ValidationOutcome> {
        let left = record.get(&self.left).and_then(|v| v.as_float());
        let right = record.get(&self.right).and_then(|v| v.as_float());

        let (left, right) = match (left, right) {
            (Some(l), Some(r)) => (l, r),
            _ => return Ok(ValidationOutcome::success()),
        };

        if self.op.holds(left, right) {
            return Ok(ValidationOutcome::success());
        }

        let message = self.message.clone().unwrap_or_else(|| {
            format!(
                "'{}' ({}) must be {} '{}' ({})",
                self.left, left, self.op, self.right, right
            )
        });
        Ok(ValidationOutcome::failure_record(ErrorRecord::for_field(
            &self.left,
            message,
            self.severity,
        )))
    }
}
