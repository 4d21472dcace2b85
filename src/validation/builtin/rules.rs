//! Per-field type and constraint checks.

use crate::core::constraint::FieldRule;
use crate::core::error::StageResult;
use crate::core::outcome::ValidationOutcome;
use crate::core::types::Record;
use crate::validation::stages::ValidationStage;

/// Format validation - checks field types and constraints.
///
/// Evaluates each [`FieldRule`] in order and reports every violation. Fields
/// that are absent are skipped. Does not halt by default.
#[derive(Debug, Clone)]
pub struct FieldRules {
    name: String,
    rules: Vec<FieldRule>,
    halts: bool,
}

impl FieldRules {
    /// Create a non-halting stage from rules.
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self {
            name: "Field Rules".to_string(),
            rules,
            halts: false,
        }
    }

    /// Override the stage name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a rule.
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the halt policy.
    pub fn with_halt(mut self, halts: bool) -> Self {
        self.halts = halts;
        self
    }

    /// The configured rules.
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl ValidationStage<Record> for FieldRules {
    fn name(&self) -> &str {
        &self.name
    }

    fn halts_on_failure(&self) -> bool {
        self.halts
    }

    fn check(&self, record: &Record) -> StageResult<ValidationOutcome> {
        let errors = self.rules.iter().flat_map(|rule| rule.check(record)).collect();
        Ok(ValidationOutcome::failures(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraint::Constraint;
    use crate::core::types::FieldType;

    fn format_stage() -> FieldRules {
        FieldRules::new(Vec::new())
            .with_name("Format")
            .rule(
                FieldRule::new("email")
                    .with_type(FieldType::String)
                    .with_constraint(Constraint::pattern(r"^[^@\s]+@[^@\s]+$").unwrap()),
            )
            .rule(FieldRule::new("amount").with_type(FieldType::Float).with_range(100.0, 50_000.0))
    }

    #[test]
    fn test_field_rules_collects_all_violations_in_rule_order() {
        let record = Record::new().with("amount", 75_000i64).with("email", "nope");
        let outcome = format_stage().check(&record).unwrap();

        let fields: Vec<_> = outcome.errors().iter().filter_map(|e| e.field()).collect();
        assert_eq!(fields, vec!["email", "amount"]);
    }

    #[test]
    fn test_field_rules_pass() {
        let record = Record::new().with("amount", 2_500.0).with("email", "ada@example.com");
        assert!(format_stage().check(&record).unwrap().is_valid());
    }

    #[test]
    fn test_field_rules_do_not_halt_by_default() {
        assert!(!format_stage().halts_on_failure());
        assert_eq!(format_stage().name(), "Format");
    }
}
