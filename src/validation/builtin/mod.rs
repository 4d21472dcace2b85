//! Built-in stages over [`Record`](crate::core::types::Record) inputs.
//!
//! These are the building blocks configuration-driven pipelines are assembled
//! from. Which fields are required, which constraints apply and which
//! subjects are screened is supplied at construction.

pub mod comparison;
pub mod required;
pub mod risk;
pub mod rules;

pub use comparison::{Comparison, FieldComparison};
pub use required::RequiredFields;
pub use risk::{BlocklistService, RiskDecision, RiskScreen, RiskService, ServiceError};
pub use rules::FieldRules;
