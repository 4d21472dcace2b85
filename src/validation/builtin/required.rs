//! Required-field presence checks.

use crate::core::error::StageResult;
use crate::core::outcome::{ErrorRecord, Severity, ValidationOutcome};
use crate::core::types::Record;
use crate::validation::stages::ValidationStage;

/// Required field validation - checks that fields are present.
///
/// A field is missing when it is absent, null, or a blank string. One record is
/// reported per missing field, in the configured order.
///
/// Halts by default: later stages may assume every required field exists.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    name: String,
    fields: Vec<String>,
    halts: bool,
}

impl RequiredFields {
    /// Create a halting stage requiring `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "Required Fields".to_string(),
            fields: fields.into_iter().map(Into::into).collect(),
            halts: true,
        }
    }

    /// Override the stage name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the halt policy.
    pub fn with_halt(mut self, halts: bool) -> Self {
        self.halts = halts;
        self
    }

    /// The required field names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl ValidationStage<Record> for RequiredFields {
    fn name(&self) -> &str {
        &self.name
    }

    fn halts_on_failure(&self) -> bool {
        self.halts
    }

    fn check(&self, record: &Record) -> StageResult<ValidationOutcome> {
        let errors = self
            .fields
            .iter()
            .filter(|field| record.is_missing(field))
            .map(|field| ErrorRecord::for_field(field, format!("'{}' is required", field), Severity::Error))
            .collect();

        Ok(ValidationOutcome::failures(errors))
    }
}
