//! Core types for the Gauntlet validation pipeline.
//!
//! This module contains the foundational types everything else builds on:
//! - Outcomes and error records
//! - Fatal error types
//! - Record values and field types
//! - Field constraints and rules

pub mod constraint;
pub mod error;
pub mod outcome;
pub mod types;

// Re-export commonly used types
pub use constraint::{Constraint, FieldRule, Pattern};
pub use error::{ConfigError, GauntletError, PipelineError, StageError};
pub use outcome::{ErrorRecord, Severity, ValidationOutcome};
pub use types::{FieldType, Record, Value};
