//! Screening against an external risk collaborator.
//!
//! The collaborator is injected and owned by the caller. Its answers fall into
//! three groups and [`RiskScreen`] maps each explicitly:
//!
//! | collaborator result              | stage result                          |
//! |----------------------------------|---------------------------------------|
//! | `Clear`                          | success                               |
//! | `Review { reason }`              | one `WARNING` record                  |
//! | `Reject { reason }`              | one `CRITICAL` record                 |
//! | `ServiceError::UnknownSubject`   | one `ERROR` record (business failure) |
//! | `Unavailable` / `Timeout`        | fatal [`StageError`]                  |

use crate::core::error::{StageError, StageResult};
use crate::core::outcome::{ErrorRecord, Severity, ValidationOutcome};
use crate::core::types::Record;
use crate::validation::stages::ValidationStage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A collaborator's verdict on a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum RiskDecision {
    /// Nothing found.
    Clear,
    /// Needs a human look; not a rejection.
    Review { reason: String },
    /// Rejected outright.
    Reject { reason: String },
}

/// Errors a risk collaborator can return.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("subject '{0}' is not known to the service")]
    UnknownSubject(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// External risk lookup used by [`RiskScreen`].
///
/// Implementations are shared across concurrent pipeline runs and must be
/// thread-safe themselves.
pub trait RiskService: Send + Sync {
    /// Name used in diagnostics and fatal errors.
    fn name(&self) -> &str;

    /// Assess one subject.
    fn assess(&self, subject: &str) -> Result<RiskDecision, ServiceError>;
}

impl<S: RiskService + ?Sized> RiskService for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn assess(&self, subject: &str) -> Result<RiskDecision, ServiceError> {
        (**self).assess(subject)
    }
}

/// Risk validation - screens a subject field with a collaborator.
///
/// Halts by default, so nothing after a rejected subject runs.
pub struct RiskScreen<S> {
    name: String,
    subject_field: String,
    service: S,
    halts: bool,
}

impl<S: RiskService> RiskScreen<S> {
    /// Screen the value of `subject_field` with `service`.
    pub fn new(subject_field: impl Into<String>, service: S) -> Self {
        Self {
            name: "Risk Screen".to_string(),
            subject_field: subject_field.into(),
            service,
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

    /// The injected collaborator.
    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: RiskService> ValidationStage<Record> for RiskScreen<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn halts_on_failure(&self) -> bool {
        self.halts
    }

    fn check(&self, record: &Record) -> StageResult<ValidationOutcome> {
        let subject = match record.present(&self.subject_field) {
            Some(value) => match value.as_string() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            },
            // Presence is the required-fields stage's job
            None => return Ok(ValidationOutcome::success()),
        };

        let field = &self.subject_field;
        match self.service.assess(&subject) {
            Ok(RiskDecision::Clear) => Ok(ValidationOutcome::success()),
            Ok(RiskDecision::Review { reason }) => Ok(ValidationOutcome::failure_record(
                ErrorRecord::for_field(field, format!("flagged for review: {}", reason), Severity::Warning),
            )),
            Ok(RiskDecision::Reject { reason }) => Ok(ValidationOutcome::failure_record(
                ErrorRecord::for_field(field, format!("rejected by risk screening: {}", reason), Severity::Critical),
            )),
            Err(ServiceError::UnknownSubject(_)) => Ok(ValidationOutcome::failure_record(
                ErrorRecord::for_field(field, format!("'{}' could not be verified", subject), Severity::Error),
            )),
            Err(ServiceError::Unavailable(reason)) => {
                Err(StageError::unavailable(self.service.name(), reason))
            }
            Err(ServiceError::Timeout(elapsed)) => Err(StageError::Timeout {
                collaborator: self.service.name().to_string(),
                elapsed,
            }),
        }
    }
}

/// In-memory [`RiskService`] backed by a blocklist.
///
/// Listed subjects are rejected with their recorded reason, everything else is
/// clear. Safe to update while pipelines are running.
#[derive(Debug, Default)]
pub struct BlocklistService {
    name: String,
    entries: RwLock<HashMap<String, String>>,
}

impl BlocklistService {
    /// Create an empty blocklist.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a blocklist from subjects, all sharing one reason.
    pub fn with_subjects<I, S>(name: impl Into<String>, subjects: I, reason: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let service = Self::new(name);
        {
            let mut entries = service.entries.write();
            for subject in subjects {
                entries.insert(subject.into(), reason.to_string());
            }
        }
        service
    }

    /// Block a subject.
    pub fn block(&self, subject: impl Into<String>, reason: impl Into<String>) {
        self.entries.write().insert(subject.into(), reason.into());
    }

    /// Unblock a subject. Returns whether it was listed.
    pub fn unblock(&self, subject: &str) -> bool {
        self.entries.write().remove(subject).is_some()
    }

    /// Number of listed subjects.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the blocklist is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl RiskService for BlocklistService {
    fn name(&self) -> &str {
        &self.name
    }

    fn assess(&self, subject: &str) -> Result<RiskDecision, ServiceError> {
        Ok(match self.entries.read().get(subject) {
            Some(reason) => RiskDecision::Reject {
                reason: reason.clone(),
            },
            None => RiskDecision::Clear,
        })
    }
}
