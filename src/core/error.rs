//! Error types for Gauntlet.
//!
//! Business-rule violations are never errors in this sense: they are
//! [`ErrorRecord`](crate::core::outcome::ErrorRecord)s inside a
//! [`ValidationOutcome`](crate::core::outcome::ValidationOutcome). The types
//! here describe the other case, where validation could not be completed at
//! all, so callers can tell "the input is invalid" apart from "the input could
//! not be checked".

use std::time::Duration;
use thiserror::Error;

/// Errors from loading inputs for validation.
///
/// Pipeline and configuration failures keep their own types; this covers
/// reading and decoding the records a pipeline is run against.
#[derive(Error, Debug)]
pub enum GauntletError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fatal error raised from inside a stage's check.
///
/// A stage returns this only when it cannot reach a business decision, for
/// example because a collaborator it depends on is down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("collaborator '{collaborator}' is unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: String, reason: String },

    #[error("collaborator '{collaborator}' timed out after {}ms", .elapsed.as_millis())]
    Timeout { collaborator: String, elapsed: Duration },

    #[error("{0}")]
    Internal(String),
}

/// Errors surfaced by a pipeline invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A stage failed fatally; the run was aborted and its partial outcome
    /// discarded.
    #[error("stage '{stage}' (#{index}) could not complete: {source}")]
    StageFailed {
        stage: String,
        index: usize,
        #[source]
        source: StageError,
    },
}

/// Errors while loading or assembling a pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read pipeline config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse pipeline config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pipeline config: {reason}")]
    Invalid { reason: String },
}

// ============================================================================
// Error Utilities
// ============================================================================

impl StageError {
    /// Shorthand for [`StageError::CollaboratorUnavailable`].
    pub fn unavailable(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        StageError::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// Name of the collaborator involved, if any.
    pub fn collaborator(&self) -> Option<&str> {
        match self {
            StageError::CollaboratorUnavailable { collaborator, .. }
            | StageError::Timeout { collaborator, .. } => Some(collaborator),
            StageError::Internal(_) => None,
        }
    }

    /// Whether retrying the same invocation later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StageError::CollaboratorUnavailable { .. } | StageError::Timeout { .. }
        )
    }
}

impl PipelineError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &str {
        match self {
            PipelineError::StageFailed { stage, .. } => stage,
        }
    }

    /// Position of the failing stage in the pipeline.
    pub fn index(&self) -> usize {
        match self {
            PipelineError::StageFailed { index, .. } => *index,
        }
    }

    /// The underlying stage error.
    pub fn stage_error(&self) -> &StageError {
        match self {
            PipelineError::StageFailed { source, .. } => source,
        }
    }
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            reason: reason.into(),
        }
    }
}

/// Result type alias for Gauntlet operations.
pub type GauntletResult<T> = Result<T, GauntletError>;

/// Result type alias for a single stage check.
pub type StageResult<T> = Result<T, StageError>;

/// Result type alias for pipeline invocations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_error_display() {
        let error = StageError::unavailable("risk-service", "connection refused");
        assert_eq!(
            error.to_string(),
            "collaborator 'risk-service' is unavailable: connection refused"
        );
        assert_eq!(error.collaborator(), Some("risk-service"));
        assert!(error.is_transient());

        let error = StageError::Timeout {
            collaborator: "risk-service".to_string(),
            elapsed: Duration::from_millis(250),
        };
        assert!(error.to_string().contains("250ms"));

        assert!(!StageError::Internal("bug".to_string()).is_transient());
    }

    #[test]
    fn test_pipeline_error_keeps_source() {
        let error = PipelineError::StageFailed {
            stage: "risk".to_string(),
            index: 2,
            source: StageError::Internal("boom".to_string()),
        };
        assert_eq!(error.stage(), "risk");
        assert_eq!(error.index(), 2);
        assert!(error.source().is_some());
        assert!(error.to_string().contains("risk"));
    }
}
