//! Batch validation of many independent inputs.
//!
//! One immutable pipeline is shared across rayon's worker threads; each input
//! is validated in its own invocation and results come back in input order.

use crate::core::error::PipelineResult;
use crate::core::outcome::{Severity, ValidationOutcome};
use crate::validation::pipeline::ValidationPipeline;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

impl<T: Sync> ValidationPipeline<T> {
    /// Validate every input in parallel, keeping input order.
    pub fn validate_batch(&self, inputs: &[T]) -> Vec<PipelineResult<ValidationOutcome>> {
        log::debug!("validating batch of {} input(s)", inputs.len());
        inputs.par_iter().map(|input| self.validate(input)).collect()
    }
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Number of inputs.
    pub total: usize,
    /// Inputs that passed.
    pub valid: usize,
    /// Inputs with at least one error record.
    pub invalid: usize,
    /// Inputs whose validation could not be completed.
    pub fatal: usize,
    /// Warning records across all outcomes.
    pub warnings: usize,
    /// Error records across all outcomes.
    pub errors: usize,
    /// Critical records across all outcomes.
    pub critical: usize,
}

impl BatchReport {
    /// Summarise batch results.
    pub fn from_results(results: &[PipelineResult<ValidationOutcome>]) -> Self {
        let mut report = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            match result {
                Ok(outcome) => {
                    if outcome.is_valid() {
                        report.valid += 1;
                    } else {
                        report.invalid += 1;
                    }
                    for error in outcome.errors() {
                        match error.severity() {
                            Severity::Warning => report.warnings += 1,
                            Severity::Error => report.errors += 1,
                            Severity::Critical => report.critical += 1,
                        }
                    }
                }
                Err(_) => report.fatal += 1,
            }
        }

        report
    }

    /// Whether every input passed.
    pub fn all_valid(&self) -> bool {
        self.valid == self.total
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} input(s): {} valid, {} invalid, {} could not be validated",
            self.total, self.valid, self.invalid, self.fatal
        )
    }
}
