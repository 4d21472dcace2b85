//! Validation module: stages, the pipeline that runs them, and the builder
//! that assembles it.
//!
//! Stages run in declaration order; outcomes are merged as they go and a
//! failing halting stage ends the run early.

pub mod batch;
pub mod builder;
pub mod builtin;
pub mod pipeline;
pub mod stages;

pub use batch::BatchReport;
pub use builder::PipelineBuilder;
pub use builtin::{
    BlocklistService, Comparison, FieldComparison, FieldRules, RequiredFields, RiskDecision,
    RiskScreen, RiskService, ServiceError,
};
pub use pipeline::{PipelineRun, StageRun, ValidationPipeline};
pub use stages::{FnStage, ValidationStage};
