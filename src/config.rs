//! Pipeline assembly from TOML.
//!
//! A config lists stages in execution order; each entry picks one of the
//! built-in stage kinds and supplies its parameters:
//!
//! ```toml
//! name = "loan-application"
//!
//! [[stages]]
//! kind = "required_fields"
//! fields = ["applicant", "amount"]
//!
//! [[stages]]
//! kind = "field_rules"
//! name = "Format"
//!
//! [[stages.rules]]
//! field = "amount"
//! field_type = "float"
//! constraints = [{ type = "range", min = 100, max = 50000 }]
//! ```

use crate::core::constraint::FieldRule;
use crate::core::error::{ConfigError, ConfigResult};
use crate::core::outcome::Severity;
use crate::core::types::Record;
use crate::validation::builder::PipelineBuilder;
use crate::validation::builtin::{
    BlocklistService, Comparison, FieldComparison, FieldRules, RequiredFields, RiskScreen,
};
use crate::validation::pipeline::ValidationPipeline;
use crate::validation::stages::ValidationStage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, for diagnostics.
    #[serde(default)]
    pub name: Option<String>,
    /// Stages in execution order.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// One stage entry. `halt` falls back to the stage kind's default policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageConfig {
    /// See [`RequiredFields`]. Halts by default.
    RequiredFields {
        #[serde(default)]
        name: Option<String>,
        fields: Vec<String>,
        #[serde(default)]
        halt: Option<bool>,
    },
    /// See [`FieldRules`]. Does not halt by default.
    FieldRules {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        rules: Vec<FieldRule>,
        #[serde(default)]
        halt: Option<bool>,
    },
    /// See [`FieldComparison`]. Does not halt by default.
    Comparison {
        #[serde(default)]
        name: Option<String>,
        left: String,
        op: Comparison,
        right: String,
        #[serde(default)]
        severity: Severity,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        halt: Option<bool>,
    },
    /// A [`RiskScreen`] over an in-memory [`BlocklistService`]. Halts by default.
    Blocklist {
        #[serde(default)]
        name: Option<String>,
        field: String,
        subjects: Vec<String>,
        #[serde(default = "default_block_reason")]
        reason: String,
        #[serde(default)]
        halt: Option<bool>,
    },
}

fn default_block_reason() -> String {
    "subject is blocklisted".to_string()
}

impl StageConfig {
    /// Reject entries that cannot produce a meaningful stage.
    fn check(&self, index: usize) -> ConfigResult<()> {
        let blank = |s: &String| s.trim().is_empty();
        match self {
            StageConfig::RequiredFields { fields, .. } => {
                if fields.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: required_fields lists no fields",
                        index
                    )));
                }
                if fields.iter().any(blank) {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: empty field name",
                        index
                    )));
                }
            }
            StageConfig::FieldRules { rules, .. } => {
                if rules.iter().any(|rule| blank(&rule.field)) {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: rule with empty field name",
                        index
                    )));
                }
            }
            StageConfig::Comparison { left, right, .. } => {
                if blank(left) || blank(right) {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: comparison needs both fields",
                        index
                    )));
                }
            }
            StageConfig::Blocklist { field, subjects, .. } => {
                if blank(field) {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: blocklist needs a subject field",
                        index
                    )));
                }
                if subjects.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "stage #{}: blocklist lists no subjects",
                        index
                    )));
                }
            }
        }
        Ok(())
    }

    /// Construct the stage this entry describes.
    fn instantiate(&self) -> Arc<dyn ValidationStage<Record>> {
        match self.clone() {
            StageConfig::RequiredFields { name, fields, halt } => {
                let mut stage = RequiredFields::new(fields);
                if let Some(name) = name {
                    stage = stage.with_name(name);
                }
                if let Some(halt) = halt {
                    stage = stage.with_halt(halt);
                }
                Arc::new(stage)
            }
            StageConfig::FieldRules { name, rules, halt } => {
                let mut stage = FieldRules::new(rules);
                if let Some(name) = name {
                    stage = stage.with_name(name);
                }
                if let Some(halt) = halt {
                    stage = stage.with_halt(halt);
                }
                Arc::new(stage)
            }
            StageConfig::Comparison {
                name,
                left,
                op,
                right,
                severity,
                message,
                halt,
            } => {
                let mut stage = FieldComparison::new(left, op, right).with_severity(severity);
                if let Some(name) = name {
                    stage = stage.with_name(name);
                }
                if let Some(message) = message {
                    stage = stage.with_message(message);
                }
                if let Some(halt) = halt {
                    stage = stage.with_halt(halt);
                }
                Arc::new(stage)
            }
            StageConfig::Blocklist {
                name,
                field,
                subjects,
                reason,
                halt,
            } => {
                let stage_name = name.unwrap_or_else(|| "Blocklist".to_string());
                let service = Arc::new(BlocklistService::with_subjects(
                    stage_name.clone(),
                    subjects,
                    &reason,
                ));
                let mut stage = RiskScreen::new(field, service).with_name(stage_name);
                if let Some(halt) = halt {
                    stage = stage.with_halt(halt);
                }
                Arc::new(stage)
            }
        }
    }
}

impl PipelineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "loaded pipeline config '{}' with {} stage(s) from {}",
            config.display_name(),
            config.stages.len(),
            path.display()
        );
        Ok(config)
    }

    /// Configured name, or a placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Assemble the pipeline.
    ///
    /// Fails if an entry is incomplete or two stages end up with the same name.
    pub fn build(&self) -> ConfigResult<ValidationPipeline<Record>> {
        let mut builder = PipelineBuilder::new();
        let mut seen = HashSet::new();

        for (index, entry) in self.stages.iter().enumerate() {
            entry.check(index)?;
            let stage = entry.instantiate();
            if !seen.insert(stage.name().to_string()) {
                return Err(ConfigError::invalid(format!(
                    "stage #{}: duplicate stage name '{}'",
                    index,
                    stage.name()
                )));
            }
            builder.push(stage);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOAN_CONFIG: &str = r#"
name = "loan-application"

[[stages]]
kind = "required_fields"
fields = ["applicant", "email", "amount"]

[[stages]]
kind = "field_rules"
name = "Format"

[[stages.rules]]
field = "email"
field_type = "string"
constraints = [{ type = "pattern", pattern = "^[^@]+@[^@]+$" }]

[[stages.rules]]
field = "amount"
field_type = "float"
constraints = [{ type = "range", min = 100, max = 50000 }]

[[stages]]
kind = "comparison"
name = "Limits"
left = "amount"
op = "le"
right = "income"
severity = "WARNING"

[[stages]]
kind = "blocklist"
field = "applicant"
subjects = ["mallory"]
"#;

    fn record(json: &str) -> Record {
        Record::from_json(json).unwrap()
    }

    #[test]
    fn test_parse_and_build() {
        let config = PipelineConfig::from_toml_str(LOAN_CONFIG).unwrap();
        assert_eq!(config.display_name(), "loan-application");

        let pipeline = config.build().unwrap();
        assert_eq!(
            pipeline.stages().collect::<Vec<_>>(),
            vec![
                ("Required Fields", true),
                ("Format", false),
                ("Limits", false),
                ("Blocklist", true),
            ]
        );
    }

    #[test]
    fn test_configured_pipeline_halts_on_missing_fields() {
        let pipeline = PipelineConfig::from_toml_str(LOAN_CONFIG).unwrap().build().unwrap();
        let outcome = pipeline.validate(&record(r#"{"amount": 1}"#)).unwrap();

        let fields: Vec<_> = outcome.errors().iter().filter_map(|e| e.field()).collect();
        assert_eq!(fields, vec!["applicant", "email"]);
    }

    #[test]
    fn test_configured_pipeline_accumulates_soft_failures() {
        let pipeline = PipelineConfig::from_toml_str(LOAN_CONFIG).unwrap().build().unwrap();
        let outcome = pipeline
            .validate(&record(
                r#"{"applicant": "ada", "email": "ada", "amount": 60000, "income": 40000}"#,
            ))
            .unwrap();

        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.errors()[2].severity(), Severity::Warning);
    }

    #[test]
    fn test_configured_blocklist_rejects() {
        let pipeline = PipelineConfig::from_toml_str(LOAN_CONFIG).unwrap().build().unwrap();
        let outcome = pipeline
            .validate(&record(
                r#"{"applicant": "mallory", "email": "m@x.io", "amount": 500, "income": 90000}"#,
            ))
            .unwrap();

        assert_eq!(outcome.highest_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_halt_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
[[stages]]
kind = "required_fields"
fields = ["a"]
halt = false
"#,
        )
        .unwrap();
        let pipeline = config.build().unwrap();
        assert_eq!(pipeline.stages().next(), Some(("Required Fields", false)));
    }

    #[test]
    fn test_empty_config_builds_accepting_pipeline() {
        let pipeline = PipelineConfig::from_toml_str("").unwrap().build().unwrap();
        assert!(pipeline.is_empty());
        assert!(pipeline.validate(&Record::new()).unwrap().is_valid());
    }

    #[test]
    fn test_rejects_invalid_entries() {
        let no_fields = PipelineConfig::from_toml_str(
            r#"
[[stages]]
kind = "required_fields"
fields = []
"#,
        )
        .unwrap();
        assert!(matches!(no_fields.build(), Err(ConfigError::Invalid { .. })));

        let duplicate = PipelineConfig::from_toml_str(
            r#"
[[stages]]
kind = "required_fields"
fields = ["a"]

[[stages]]
kind = "required_fields"
fields = ["b"]
"#,
        )
        .unwrap();
        let error = duplicate.build().unwrap_err();
        assert!(error.to_string().contains("duplicate stage name"));
    }

    fn invalid_reason(toml: &str) -> String {
        let config = PipelineConfig::from_toml_str(toml).unwrap();
        match config.build() {
            Err(ConfigError::Invalid { reason }) => reason,
            other => panic!("expected an invalid config, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_rejects_incomplete_stage_entries() {
        let reason = invalid_reason(
            r#"
[[stages]]
kind = "required_fields"
fields = ["applicant", "  "]
"#,
        );
        assert_eq!(reason, "stage #0: empty field name");

        let reason = invalid_reason(
            r#"
[[stages]]
kind = "field_rules"

[[stages.rules]]
field = ""
"#,
        );
        assert_eq!(reason, "stage #0: rule with empty field name");

        let reason = invalid_reason(
            r#"
[[stages]]
kind = "comparison"
left = "amount"
op = "le"
right = " "
"#,
        );
        assert_eq!(reason, "stage #0: comparison needs both fields");

        let reason = invalid_reason(
            r#"
[[stages]]
kind = "blocklist"
field = "applicant"
subjects = []
"#,
        );
        assert_eq!(reason, "stage #0: blocklist lists no subjects");

        let reason = invalid_reason(
            r#"
[[stages]]
kind = "required_fields"
fields = ["applicant"]

[[stages]]
kind = "blocklist"
field = ""
subjects = ["mallory"]
"#,
        );
        assert_eq!(reason, "stage #1: blocklist needs a subject field");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PipelineConfig::from_toml_str("[[stages]]\nkind = \"teleport\"\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str(
                "[[stages]]\nkind = \"field_rules\"\n[[stages.rules]]\nfield = \"x\"\nconstraints = [{ type = \"pattern\", pattern = \"(\" }]\n"
            ),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LOAN_CONFIG.as_bytes()).unwrap();

        let config = PipelineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.stages.len(), 4);

        let missing = PipelineConfig::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
