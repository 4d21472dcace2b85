//! Field constraints and per-field rules.
//!
//! A [`FieldRule`] names a record field, the type it must have, and a list of
//! [`Constraint`]s its value must satisfy. Rules are declared in code or in a
//! pipeline config and evaluated by
//! [`FieldRules`](crate::validation::builtin::FieldRules).

use crate::core::outcome::{ErrorRecord, Severity};
use crate::core::types::{FieldType, Record, Value};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A compiled regular expression that (de)serializes as its source string.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether `text` contains a match.
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Signature of a code-only constraint check.
pub type ConstraintFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Constraints that can be applied to a field value.
///
/// A constraint that does not apply to the value's type passes; type
/// enforcement is the job of [`FieldRule::field_type`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Numeric value must be within range [min, max]
    Range { min: f64, max: f64 },
    /// Numeric value must be >= min
    MinValue { min: f64 },
    /// Numeric value must be <= max
    MaxValue { max: f64 },

    /// String/array/map length must be >= min
    MinLength { min: usize },
    /// String/array/map length must be <= max
    MaxLength { max: usize },
    /// String must match the regular expression
    Pattern { pattern: Pattern },
    /// String/array/map must not be empty
    NotEmpty,

    /// Value must equal one of the options
    OneOf { options: Vec<Value> },
    /// Numeric value must be > 0
    Positive,
    /// Numeric value must be >= 0
    NonNegative,

    /// Custom constraint with validation function
    /// Note: The closure is skipped during serialization
    #[serde(skip)]
    Custom {
        name: String,
        description: String,
        validator: ConstraintFn,
    },
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Constraint::MinValue { min } => f.debug_struct("MinValue").field("min", min).finish(),
            Constraint::MaxValue { max } => f.debug_struct("MaxValue").field("max", max).finish(),
            Constraint::MinLength { min } => f.debug_struct("MinLength").field("min", min).finish(),
            Constraint::MaxLength { max } => f.debug_struct("MaxLength").field("max", max).finish(),
            Constraint::Pattern { pattern } => f.debug_struct("Pattern").field("pattern", pattern).finish(),
            Constraint::NotEmpty => write!(f, "NotEmpty"),
            Constraint::OneOf { options } => f.debug_struct("OneOf").field("options", options).finish(),
            Constraint::Positive => write!(f, "Positive"),
            Constraint::NonNegative => write!(f, "NonNegative"),
            Constraint::Custom { name, description, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("description", description)
                .field("validator", &"<closure>")
                .finish(),
        }
    }
}

// ============================================================================
// Constraint Validation
// ============================================================================

impl Constraint {
    /// Build a pattern constraint, compiling the expression.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Constraint::Pattern {
            pattern: Pattern::new(source)?,
        })
    }

    /// Build a code-only constraint.
    pub fn custom<F>(name: impl Into<String>, description: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Constraint::Custom {
            name: name.into(),
            description: description.into(),
            validator: Arc::new(validator),
        }
    }

    /// Validate a value against this constraint.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::Range { min, max } => {
                if let Some(num) = value.as_float() {
                    if num < *min || num > *max {
                        return Err(format!("Value {} is out of range [{}, {}]", num, min, max));
                    }
                }
            }

            Constraint::MinValue { min } => {
                if let Some(num) = value.as_float() {
                    if num < *min {
                        return Err(format!("Value {} is below minimum {}", num, min));
                    }
                }
            }

            Constraint::MaxValue { max } => {
                if let Some(num) = value.as_float() {
                    if num > *max {
                        return Err(format!("Value {} is above maximum {}", num, max));
                    }
                }
            }

            Constraint::MinLength { min } => {
                if let Some(len) = value.length() {
                    if len < *min {
                        return Err(format!("Length {} is below minimum {}", len, min));
                    }
                }
            }

            Constraint::MaxLength { max } => {
                if let Some(len) = value.length() {
                    if len > *max {
                        return Err(format!("Length {} is above maximum {}", len, max));
                    }
                }
            }

            Constraint::Pattern { pattern } => {
                if let Some(s) = value.as_string() {
                    if !pattern.is_match(s) {
                        return Err(format!(
                            "Value '{}' does not match pattern '{}'",
                            s,
                            pattern.as_str()
                        ));
                    }
                }
            }

            Constraint::NotEmpty => {
                if value.length() == Some(0) {
                    return Err("Value cannot be empty".to_string());
                }
            }

            Constraint::OneOf { options } => {
                let matches = options
                    .iter()
                    .any(|opt| opt == value || (opt.as_float().is_some() && opt.as_float() == value.as_float()));
                if !matches {
                    let allowed: Vec<String> = options.iter().map(Value::to_string).collect();
                    return Err(format!(
                        "Value {} is not one of [{}]",
                        value,
                        allowed.join(", ")
                    ));
                }
            }

            Constraint::Positive => {
                if let Some(num) = value.as_float() {
                    if num <= 0.0 {
                        return Err(format!("Value {} must be positive", num));
                    }
                }
            }

            Constraint::NonNegative => {
                if let Some(num) = value.as_float() {
                    if num < 0.0 {
                        return Err(format!("Value {} must be non-negative", num));
                    }
                }
            }

            Constraint::Custom { name, validator, .. } => {
                validator(value).map_err(|e| format!("{}: {}", name, e))?;
            }
        }

        Ok(())
    }

    /// Get a human-readable description of this constraint.
    pub fn description(&self) -> String {
        match self {
            Constraint::Range { min, max } => format!("Must be between {} and {}", min, max),
            Constraint::MinValue { min } => format!("Must be at least {}", min),
            Constraint::MaxValue { max } => format!("Must be at most {}", max),
            Constraint::MinLength { min } => format!("Minimum length: {}", min),
            Constraint::MaxLength { max } => format!("Maximum length: {}", max),
            Constraint::Pattern { pattern } => format!("Must match pattern: {}", pattern.as_str()),
            Constraint::NotEmpty => "Cannot be empty".to_string(),
            Constraint::OneOf { options } => format!("One of {} options", options.len()),
            Constraint::Positive => "Must be positive".to_string(),
            Constraint::NonNegative => "Must be non-negative".to_string(),
            Constraint::Custom { description, .. } => description.clone(),
        }
    }
}

/// Type and constraints for one record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    /// Field name in the record
    pub field: String,
    /// Required type; `any` skips the type check
    #[serde(default)]
    pub field_type: FieldType,
    /// Constraints checked in order
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Severity of the records this rule reports
    #[serde(default)]
    pub severity: Severity,
}

impl FieldRule {
    /// Create a rule accepting any type, with no constraints.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            field_type: FieldType::Any,
            constraints: Vec::new(),
            severity: Severity::Error,
        }
    }

    /// Require a type.
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add a range constraint.
    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_constraint(Constraint::Range { min, max })
    }

    /// Set the severity of reported records.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Check the rule against a record.
    ///
    /// Absent or null fields produce nothing. A type mismatch yields one record
    /// and skips the constraints; otherwise every failing constraint yields one
    /// record, in declaration order.
    pub fn check(&self, record: &Record) -> Vec<ErrorRecord> {
        let value = match record.get(&self.field) {
            Some(value) if !value.is_null() => value,
            _ => return Vec::new(),
        };

        if !self.field_type.matches(value) {
            return vec![ErrorRecord::for_field(
                &self.field,
                format!(
                    "Type mismatch for field '{}': expected {}, got {}",
                    self.field,
                    self.field_type,
                    value.field_type()
                ),
                self.severity,
            )];
        }

        self.constraints
            .iter()
            .filter_map(|constraint| constraint.validate(value).err())
            .map(|message| ErrorRecord::for_field(&self.field, message, self.severity))
            .collect()
    }
}
