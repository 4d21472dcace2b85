//! Validation pipeline implementation.

use crate::core::error::{PipelineError, PipelineResult};
use crate::core::outcome::ValidationOutcome;
use crate::validation::builder::PipelineBuilder;
use crate::validation::stages::ValidationStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A stage together with the halt policy captured when it was added.
pub(crate) struct StageSlot<T: ?Sized> {
    pub(crate) stage: Arc<dyn ValidationStage<T>>,
    pub(crate) halts: bool,
}

impl<T: ?Sized> StageSlot<T> {
    pub(crate) fn new(stage: Arc<dyn ValidationStage<T>>) -> Self {
        let halts = stage.halts_on_failure();
        Self { stage, halts }
    }
}

impl<T: ?Sized> Clone for StageSlot<T> {
    fn clone(&self) -> Self {
        Self {
            stage: Arc::clone(&self.stage),
            halts: self.halts,
        }
    }
}

/// Multi-stage validation pipeline.
///
/// Runs its stages in declaration order against one input, merging their
/// outcomes. A failing stage whose halt policy is set stops the run; the
/// errors collected up to and including that stage are returned. A stage that
/// fails fatally aborts the run with a [`PipelineError`] instead.
///
/// The pipeline is immutable and `Send + Sync`: share it (or clone it, which
/// only bumps reference counts) across threads and call it concurrently.
pub struct ValidationPipeline<T: ?Sized> {
    stages: Vec<StageSlot<T>>,
}

/// Record of one stage that ran during a traced invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRun {
    /// Position of the stage in the pipeline.
    pub index: usize,
    /// Stage name.
    pub name: String,
    /// Whether the stage's own outcome was valid.
    pub valid: bool,
    /// Number of records the stage reported.
    pub error_count: usize,
    /// Whether this stage stopped the pipeline.
    pub halted: bool,
    /// Time spent in the stage's check, in microseconds.
    pub duration_us: u64,
}

/// Result of a traced invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// The merged outcome, identical to what [`ValidationPipeline::validate`] returns.
    pub outcome: ValidationOutcome,
    /// Stages that actually ran, in order.
    pub stages: Vec<StageRun>,
    /// Number of stages in the pipeline that produced this run.
    pub total_stages: usize,
    /// Name of the stage that stopped the run early, if any.
    pub halted_by: Option<String>,
    /// Total time for the invocation in milliseconds.
    pub duration_ms: u64,
}

impl PipelineRun {
    /// Number of stages skipped because of an early halt.
    pub fn skipped(&self) -> usize {
        self.total_stages.saturating_sub(self.stages.len())
    }
}

impl<T: ?Sized> ValidationPipeline<T> {
    pub(crate) fn from_slots(stages: Vec<StageSlot<T>>) -> Self {
        Self { stages }
    }

    /// Create a pipeline with no stages. It accepts every input.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Start assembling a pipeline.
    pub fn builder() -> PipelineBuilder<T> {
        PipelineBuilder::new()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|slot| slot.stage.name()).collect()
    }

    /// Stage names paired with their halt policies, in execution order.
    pub fn stages(&self) -> impl Iterator<Item = (&str, bool)> {
        self.stages.iter().map(|slot| (slot.stage.name(), slot.halts))
    }

    /// Validate an input through all stages.
    pub fn validate(&self, input: &T) -> PipelineResult<ValidationOutcome> {
        self.execute(input, |_| {}).map(|(outcome, _)| outcome)
    }

    /// Validate an input and record which stages ran.
    pub fn validate_traced(&self, input: &T) -> PipelineResult<PipelineRun> {
        let start = Instant::now();
        let mut stages = Vec::with_capacity(self.stages.len());
        let (outcome, halted_at) = self.execute(input, |run| stages.push(run))?;

        Ok(PipelineRun {
            outcome,
            stages,
            total_stages: self.stages.len(),
            halted_by: halted_at.map(|index| self.stages[index].stage.name().to_string()),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Quick validation - just check whether the input passes.
    pub fn is_valid(&self, input: &T) -> PipelineResult<bool> {
        self.validate(input).map(|outcome| outcome.is_valid())
    }

    /// Core loop shared by the public entry points.
    ///
    /// Returns the accumulated outcome and the index of the halting stage, if
    /// the run stopped early.
    fn execute<F>(&self, input: &T, mut observe: F) -> PipelineResult<(ValidationOutcome, Option<usize>)>
    where
        F: FnMut(StageRun),
    {
        let mut accumulated = ValidationOutcome::success();
        let total = self.stages.len();

        for (index, slot) in self.stages.iter().enumerate() {
            let name = slot.stage.name();
            let started = Instant::now();

            let result = slot.stage.check(input).map_err(|source| {
                log::warn!("stage '{}' ({}/{}) failed fatally: {}", name, index + 1, total, source);
                PipelineError::StageFailed {
                    stage: name.to_string(),
                    index,
                    source,
                }
            })?;

            let valid = result.is_valid();
            let halted = !valid && slot.halts;
            log::debug!(
                "stage '{}' ({}/{}): valid={} errors={}",
                name,
                index + 1,
                total,
                valid,
                result.len()
            );
            observe(StageRun {
                index,
                name: name.to_string(),
                valid,
                error_count: result.len(),
                halted,
                duration_us: started.elapsed().as_micros() as u64,
            });

            accumulated = accumulated.combine(result);

            if halted {
                log::info!(
                    "stage '{}' failed and halts the pipeline; skipping {} remaining stage(s)",
                    name,
                    total - index - 1
                );
                return Ok((accumulated, Some(index)));
            }
        }

        Ok((accumulated, None))
    }
}

impl<T: ?Sized> Clone for ValidationPipeline<T> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<T: ?Sized> Default for ValidationPipeline<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> fmt::Debug for ValidationPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|slot| (slot.stage.name(), slot.halts)))
            .finish()
    }
}
