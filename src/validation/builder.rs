//! Fluent assembly of validation pipelines.

use crate::validation::pipeline::{StageSlot, ValidationPipeline};
use crate::validation::stages::ValidationStage;
use std::sync::Arc;

/// Builder for creating a [`ValidationPipeline`].
///
/// Stages run in the order they are added. Each stage's halt policy is read
/// when it is added and frozen from then on. [`build`](Self::build) copies the
/// stage list, so the builder can keep growing and produce further pipelines
/// without touching the ones already built.
pub struct PipelineBuilder<T: ?Sized> {
    stages: Vec<StageSlot<T>>,
}

impl<T: ?Sized> PipelineBuilder<T> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    pub fn add<S>(self, stage: S) -> Self
    where
        S: ValidationStage<T> + 'static,
    {
        self.add_shared(Arc::new(stage))
    }

    /// Append a stage that is shared with other pipelines or with the caller.
    pub fn add_shared<S>(mut self, stage: Arc<S>) -> Self
    where
        S: ValidationStage<T> + 'static,
    {
        self.stages.push(StageSlot::new(stage));
        self
    }

    /// Append a boxed stage.
    pub fn add_boxed(mut self, stage: Box<dyn ValidationStage<T>>) -> Self {
        self.stages.push(StageSlot::new(Arc::from(stage)));
        self
    }

    /// Append a stage through a mutable reference, for conditional assembly.
    pub fn push(&mut self, stage: Arc<dyn ValidationStage<T>>) -> &mut Self {
        self.stages.push(StageSlot::new(stage));
        self
    }

    /// Number of stages added so far.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if no stages have been added.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Build a pipeline from the stages added so far.
    pub fn build(&self) -> ValidationPipeline<T> {
        log::debug!("building validation pipeline with {} stage(s)", self.stages.len());
        ValidationPipeline::from_slots(self.stages.clone())
    }
}

impl<T: ?Sized> Default for PipelineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
