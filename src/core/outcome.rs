//! Validation outcomes and the error records they carry.
//!
//! An outcome is the value a stage returns for a business-rule check. Outcomes
//! are immutable: combining two of them with [`ValidationOutcome::merge`]
//! produces a new outcome and leaves both constituents untouched.
//!
//! Merge is associative with [`ValidationOutcome::success`] as its identity, so
//! independent partial results can be folded in any grouping as long as their
//! order is kept.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when a record is constructed with a blank message.
pub const UNSPECIFIED_MESSAGE: &str = "unspecified validation failure";

/// Informational classification of an error record.
///
/// Severity is presentation metadata for the caller. It never decides whether
/// a pipeline stops; that is the job of each stage's halt policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Worth showing, not necessarily blocking.
    Warning,
    /// A regular rule violation.
    #[default]
    Error,
    /// A violation that should be escalated.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawErrorRecord")]
pub struct ErrorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    message: String,
    severity: Severity,
}

#[derive(Deserialize)]
struct RawErrorRecord {
    #[serde(default)]
    field: Option<String>,
    message: String,
    #[serde(default)]
    severity: Severity,
}

impl TryFrom<RawErrorRecord> for ErrorRecord {
    type Error = String;

    fn try_from(raw: RawErrorRecord) -> Result<Self, Self::Error> {
        if raw.message.trim().is_empty() {
            return Err("error record message must not be empty".to_string());
        }
        Ok(Self {
            field: raw.field,
            message: raw.message,
            severity: raw.severity,
        })
    }
}

impl ErrorRecord {
    /// Create a record that is not tied to a particular field.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: None,
            message: normalize_message(message.into()),
            severity,
        }
    }

    /// Create a record for a named input field.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            field: Some(field.into()),
            message: normalize_message(message.into()),
            severity,
        }
    }

    /// Shorthand for an [`Severity::Error`] record.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    /// Shorthand for a [`Severity::Warning`] record.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    /// Shorthand for a [`Severity::Critical`] record.
    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Critical)
    }

    /// Attach or replace the offending field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// The offending field, if the violation is tied to one.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Human-readable description. Never empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity classification.
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "[{}] {}: {}", self.severity, field, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

fn normalize_message(message: String) -> String {
    if message.trim().is_empty() {
        log::warn!("error record created with an empty message");
        UNSPECIFIED_MESSAGE.to_string()
    } else {
        message
    }
}

/// The result of validating one input against one stage, or the merged result
/// of several stages.
///
/// `valid` is true exactly when `errors` is empty for every outcome a stage can
/// construct, and merging preserves that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome")]
pub struct ValidationOutcome {
    valid: bool,
    errors: Vec<ErrorRecord>,
}

#[derive(Deserialize)]
struct RawOutcome {
    valid: bool,
    #[serde(default)]
    errors: Vec<ErrorRecord>,
}

impl TryFrom<RawOutcome> for ValidationOutcome {
    type Error = String;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        if raw.valid != raw.errors.is_empty() {
            return Err(format!(
                "outcome claims valid={} with {} error(s)",
                raw.valid,
                raw.errors.len()
            ));
        }
        Ok(Self {
            valid: raw.valid,
            errors: raw.errors,
        })
    }
}

impl ValidationOutcome {
    /// A passing outcome with no errors. Identity element of [`merge`](Self::merge).
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing outcome with one [`Severity::Error`] record and no field.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_record(ErrorRecord::error(message))
    }

    /// A failing outcome with one [`Severity::Error`] record for `field`.
    pub fn field_failure(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::failure_record(ErrorRecord::for_field(field, message, Severity::Error))
    }

    /// A failing outcome with one record.
    pub fn failure_record(record: ErrorRecord) -> Self {
        Self {
            valid: false,
            errors: vec![record],
        }
    }

    /// An outcome built from a list of records.
    ///
    /// Validity follows the list: an empty list gives a *valid* outcome with no
    /// errors. Callers that want "no specific error but still invalid" have to
    /// supply at least one record.
    pub fn failures(errors: Vec<ErrorRecord>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether the validated input passed.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors in detection order.
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Take ownership of the error list.
    pub fn into_errors(self) -> Vec<ErrorRecord> {
        self.errors
    }

    /// Number of error records.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether there are no error records.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Combine two outcomes into a new one.
    ///
    /// The result holds `self`'s errors followed by `other`'s and is valid only
    /// if both inputs are.
    pub fn merge(&self, other: &ValidationOutcome) -> ValidationOutcome {
        self.clone().combine(other.clone())
    }

    /// Consuming form of [`merge`](Self::merge), reusing `self`'s allocation.
    pub fn combine(mut self, other: ValidationOutcome) -> ValidationOutcome {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
        self
    }

    /// The most severe record, if any.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.errors.iter().map(ErrorRecord::severity).max()
    }

    /// Records with exactly the given severity, in detection order.
    pub fn errors_with_severity(&self, severity: Severity) -> impl Iterator<Item = &ErrorRecord> {
        self.errors.iter().filter(move |e| e.severity == severity)
    }

    /// Records attached to `field`, in detection order.
    pub fn errors_for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ErrorRecord> {
        self.errors.iter().filter(move |e| e.field() == Some(field))
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        if self.valid {
            "✓ Input is valid".to_string()
        } else {
            let critical = self.errors_with_severity(Severity::Critical).count();
            if critical > 0 {
                format!(
                    "✗ Validation failed with {} error(s), {} critical",
                    self.errors.len(),
                    critical
                )
            } else {
                format!("✗ Validation failed with {} error(s)", self.errors.len())
            }
        }
    }

    /// Numbered error lines, one per record.
    pub fn detailed_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, error)| format!("{}. {}", i + 1, error))
            .collect()
    }
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::success()
    }
}

impl FromIterator<ValidationOutcome> for ValidationOutcome {
    fn from_iter<I: IntoIterator<Item = ValidationOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(Self::success(), Self::combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn severity_strategy() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Warning),
            Just(Severity::Error),
            Just(Severity::Critical),
        ]
    }

    fn record_strategy() -> impl Strategy<Value = ErrorRecord> {
        (
            proptest::option::of("[a-z]{1,8}"),
            "[a-z ]{0,12}[a-z]",
            severity_strategy(),
        )
            .prop_map(|(field, message, severity)| match field {
                Some(field) => ErrorRecord::for_field(field, message, severity),
                None => ErrorRecord::new(message, severity),
            })
    }

    fn outcome_strategy() -> impl Strategy<Value = ValidationOutcome> {
        proptest::collection::vec(record_strategy(), 0..4).prop_map(ValidationOutcome::failures)
    }

    #[test]
    fn test_success_is_valid_and_empty() {
        let outcome = ValidationOutcome::success();
        assert!(outcome.is_valid());
        assert!(outcome.errors().is_empty());
    }

    #[test]
    fn test_failure_defaults_to_error_severity() {
        let outcome = ValidationOutcome::failure("amount exceeds limit");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.errors()[0].severity(), Severity::Error);
        assert_eq!(outcome.errors()[0].field(), None);

        let outcome = ValidationOutcome::field_failure("amount", "must be positive");
        assert_eq!(outcome.errors()[0].field(), Some("amount"));
        assert_eq!(outcome.errors()[0].severity(), Severity::Error);
    }

    #[test]
    fn test_failures_with_empty_list_is_valid() {
        let outcome = ValidationOutcome::failures(Vec::new());
        assert!(outcome.is_valid());
        assert!(outcome.errors().is_empty());
        assert_eq!(outcome, ValidationOutcome::success());
    }

    #[test]
    fn test_merge_preserves_order_and_inputs() {
        let a = ValidationOutcome::failures(vec![ErrorRecord::error("a1"), ErrorRecord::error("a2")]);
        let b = ValidationOutcome::failure("b1");

        let merged = a.merge(&b);
        let messages: Vec<_> = merged.errors().iter().map(|e| e.message()).collect();
        assert_eq!(messages, vec!["a1", "a2", "b1"]);
        assert!(!merged.is_valid());

        // Originals untouched
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_empty_message_is_normalized() {
        let record = ErrorRecord::error("   ");
        assert_eq!(record.message(), UNSPECIFIED_MESSAGE);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);

        let outcome = ValidationOutcome::failures(vec![
            ErrorRecord::warning("w"),
            ErrorRecord::critical("c"),
            ErrorRecord::error("e"),
        ]);
        assert_eq!(outcome.highest_severity(), Some(Severity::Critical));
        assert_eq!(outcome.errors_with_severity(Severity::Warning).count(), 1);
        assert_eq!(ValidationOutcome::success().highest_severity(), None);
    }

    #[test]
    fn test_severity_defaults_to_error() {
        assert_eq!(Severity::default(), Severity::Error);

        let record: ErrorRecord = serde_json::from_str(r#"{"message": "no severity given"}"#).unwrap();
        assert_eq!(record.severity(), Severity::Error);
    }

    #[test]
    fn test_errors_for_field() {
        let outcome = ValidationOutcome::failures(vec![
            ErrorRecord::for_field("email", "missing @", Severity::Error),
            ErrorRecord::for_field("amount", "negative", Severity::Error),
            ErrorRecord::for_field("email", "too long", Severity::Warning),
        ]);
        let email: Vec<_> = outcome.errors_for_field("email").map(|e| e.message()).collect();
        assert_eq!(email, vec!["missing @", "too long"]);
    }

    #[test]
    fn test_summary_and_details() {
        assert!(ValidationOutcome::success().summary().contains("valid"));

        let outcome = ValidationOutcome::failures(vec![
            ErrorRecord::for_field("amount", "negative", Severity::Error),
            ErrorRecord::critical("flagged"),
        ]);
        assert!(outcome.summary().contains("2 error(s)"));
        assert!(outcome.summary().contains("1 critical"));

        let details = outcome.detailed_errors();
        assert_eq!(details[0], "1. [ERROR] amount: negative");
        assert_eq!(details[1], "2. [CRITICAL] flagged");
    }

    #[test]
    fn test_serde_shape() {
        let outcome = ValidationOutcome::field_failure("amount", "negative");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0]["severity"], "ERROR");
        assert_eq!(json["errors"][0]["field"], "amount");

        let back: ValidationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_outcome() {
        let json = r#"{"valid": true, "errors": [{"message": "oops", "severity": "ERROR"}]}"#;
        assert!(serde_json::from_str::<ValidationOutcome>(json).is_err());

        let json = r#"{"valid": false, "errors": []}"#;
        assert!(serde_json::from_str::<ValidationOutcome>(json).is_err());

        let json = r#"{"valid": false, "errors": [{"message": ""}]}"#;
        assert!(serde_json::from_str::<ValidationOutcome>(json).is_err());
    }

    #[test]
    fn test_collect_folds_in_order() {
        let outcome: ValidationOutcome = vec![
            ValidationOutcome::success(),
            ValidationOutcome::failure("first"),
            ValidationOutcome::failure("second"),
        ]
        .into_iter()
        .collect();
        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.errors()[0].message(), "first");
    }

    proptest! {
        #[test]
        fn test_merge_identity(a in outcome_strategy()) {
            prop_assert_eq!(a.merge(&ValidationOutcome::success()), a.clone());
            prop_assert_eq!(ValidationOutcome::success().merge(&a), a);
        }

        #[test]
        fn test_merge_associative(
            a in outcome_strategy(),
            b in outcome_strategy(),
            c in outcome_strategy(),
        ) {
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn test_merge_validity_is_conjunction(parts in proptest::collection::vec(outcome_strategy(), 0..6)) {
            let merged: ValidationOutcome = parts.iter().cloned().collect();
            prop_assert_eq!(merged.is_valid(), parts.iter().all(ValidationOutcome::is_valid));
            prop_assert_eq!(merged.is_valid(), merged.errors().is_empty());
            let total: usize = parts.iter().map(ValidationOutcome::len).sum();
            prop_assert_eq!(merged.len(), total);
        }
    }
}
