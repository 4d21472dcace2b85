//! # Gauntlet - Multi-stage Validation Pipelines
//!
//! Gauntlet runs an ordered sequence of independent business-rule checks over a
//! single input, accumulates structured errors across stages, and lets each
//! stage decide whether its own failure stops the rest of the run.
//!
//! ## Features
//!
//! - **Error accumulation**: Clients see every fixable problem in one pass
//! - **Per-stage halt policy**: Structural or security checks can short-circuit
//! - **Two error taxonomies**: Business failures are outcomes, infrastructure
//!   failures are `Err`s
//! - **Shareable**: Pipelines are immutable and `Send + Sync`
//! - **Configurable**: Built-in stages over dynamic records, assembled from TOML
//!
//! ## Quick Start
//!
//! ```rust
//! use gauntlet::prelude::*;
//!
//! struct Application {
//!     applicant: String,
//!     amount: u64,
//! }
//!
//! let pipeline = ValidationPipeline::builder()
//!     .add(
//!         FnStage::new("required", |app: &Application| {
//!             if app.applicant.is_empty() {
//!                 ValidationOutcome::field_failure("applicant", "applicant is required")
//!             } else {
//!                 ValidationOutcome::success()
//!             }
//!         })
//!         .halting(),
//!     )
//!     .add(FnStage::new("limits", |app: &Application| {
//!         if app.amount > 50_000 {
//!             ValidationOutcome::field_failure("amount", "amount exceeds 50000")
//!         } else {
//!             ValidationOutcome::success()
//!         }
//!     }))
//!     .build();
//!
//! let outcome = pipeline
//!     .validate(&Application { applicant: "Ada".into(), amount: 75_000 })
//!     .unwrap();
//! assert!(!outcome.is_valid());
//! assert_eq!(outcome.errors()[0].field(), Some("amount"));
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`core`]: Outcomes, error records, fatal errors, record values and constraints
//! - [`validation`]: Stage trait, pipeline, builder, batch execution, built-in stages
//! - [`config`]: TOML assembly of record pipelines

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust
/// use gauntlet::prelude::*;
/// ```
pub mod prelude {
    // Outcomes
    pub use crate::core::outcome::{ErrorRecord, Severity, ValidationOutcome};

    // Errors
    pub use crate::core::error::{
        ConfigError, GauntletError, PipelineError, StageError, StageResult,
    };

    // Records and rules
    pub use crate::core::constraint::{Constraint, FieldRule};
    pub use crate::core::types::{FieldType, Record, Value};

    // Pipeline
    pub use crate::validation::batch::BatchReport;
    pub use crate::validation::builder::PipelineBuilder;
    pub use crate::validation::pipeline::{PipelineRun, StageRun, ValidationPipeline};
    pub use crate::validation::stages::{FnStage, ValidationStage};

    // Built-in stages
    pub use crate::validation::builtin::{
        BlocklistService, Comparison, FieldComparison, FieldRules, RequiredFields, RiskDecision,
        RiskScreen, RiskService, ServiceError,
    };

    // Configuration
    pub use crate::config::{PipelineConfig, StageConfig};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn loan_pipeline(blocklist: std::sync::Arc<BlocklistService>) -> ValidationPipeline<Record> {
        ValidationPipeline::builder()
            .add(RequiredFields::new(["applicant", "amount"]))
            .add(
                FieldRules::new(Vec::new())
                    .with_name("Format")
                    .rule(FieldRule::new("amount").with_type(FieldType::Float).with_constraint(Constraint::Positive)),
            )
            .add(
                FieldRules::new(Vec::new())
                    .with_name("Limits")
                    .rule(FieldRule::new("amount").with_range(0.0, 50_000.0)),
            )
            .add(RiskScreen::new("applicant", blocklist))
            .build()
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "gauntlet");
    }

    #[test]
    fn test_required_fields_short_circuit() {
        let pipeline = loan_pipeline(std::sync::Arc::new(BlocklistService::new("blocklist")));
        let run = pipeline.validate_traced(&Record::new()).unwrap();

        assert_eq!(run.outcome.len(), 2);
        assert_eq!(run.halted_by.as_deref(), Some("Required Fields"));
        assert_eq!(run.stages.len(), 1);
    }

    #[test]
    fn test_soft_stages_accumulate() {
        let pipeline = loan_pipeline(std::sync::Arc::new(BlocklistService::new("blocklist")));
        let record = Record::new().with("applicant", "ada").with("amount", -60_000i64);

        let outcome = pipeline.validate(&record).unwrap();
        assert_eq!(outcome.len(), 2);
        assert!(outcome.errors().iter().all(|e| e.field() == Some("amount")));
    }

    #[test]
    fn test_risk_stage_runs_last() {
        let blocklist = std::sync::Arc::new(BlocklistService::with_subjects("blocklist", ["mallory"], "fraud"));
        let pipeline = loan_pipeline(blocklist);
        let record = Record::new().with("applicant", "mallory").with("amount", 1_000i64);

        let outcome = pipeline.validate(&record).unwrap();
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.highest_severity(), Some(Severity::Critical));
    }
}
