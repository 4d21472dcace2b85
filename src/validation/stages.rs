//! The stage abstraction.
//!
//! A stage is one independent business-rule check. It reads the input and
//! returns a [`ValidationOutcome`]; it never mutates the input and holds no
//! per-invocation state, so one instance can serve many concurrent runs.

use crate::core::error::StageResult;
use crate::core::outcome::ValidationOutcome;
use std::fmt;
use std::marker::PhantomData;

/// Trait for validation stages.
pub trait ValidationStage<T: ?Sized>: Send + Sync {
    /// Name of this validation stage, used in diagnostics.
    fn name(&self) -> &str;

    /// Whether a failing outcome from this stage stops the pipeline.
    ///
    /// Read once when the stage is added to a pipeline builder.
    fn halts_on_failure(&self) -> bool {
        false
    }

    /// Check the input.
    ///
    /// Business-rule violations are reported as a failed outcome. `Err` is
    /// reserved for conditions under which no decision can be made at all, and
    /// aborts the whole pipeline run.
    fn check(&self, input: &T) -> StageResult<ValidationOutcome>;
}

/// A stage backed by a closure.
///
/// ```rust
/// use gauntlet::prelude::*;
///
/// let positive = FnStage::new("positive", |n: &i64| {
///     if *n > 0 {
///         ValidationOutcome::success()
///     } else {
///         ValidationOutcome::failure("must be positive")
///     }
/// });
/// assert!(positive.check(&3).unwrap().is_valid());
/// ```
pub struct FnStage<T: ?Sized, F> {
    name: String,
    halts: bool,
    check: F,
    _input: PhantomData<fn(&T)>,
}

impl<T, F> FnStage<T, InfallibleCheck<F>>
where
    T: ?Sized,
    F: Fn(&T) -> ValidationOutcome + Send + Sync,
{
    /// Create a non-halting stage from a check that cannot fail fatally.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            halts: false,
            check: InfallibleCheck(check),
            _input: PhantomData,
        }
    }
}

impl<T, F> FnStage<T, F>
where
    T: ?Sized,
    F: Fn(&T) -> StageResult<ValidationOutcome> + Send + Sync,
{
    /// Create a non-halting stage from a check that may fail fatally.
    pub fn fallible(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            halts: false,
            check,
            _input: PhantomData,
        }
    }
}

impl<T: ?Sized, F> FnStage<T, F> {
    /// Make the stage stop the pipeline when it fails.
    pub fn halting(mut self) -> Self {
        self.halts = true;
        self
    }

    /// Set the halt policy explicitly.
    pub fn with_halt(mut self, halts: bool) -> Self {
        self.halts = halts;
        self
    }
}

/// Adapter turning an outcome-returning closure into a [`StageCheck`].
pub struct InfallibleCheck<F>(F);

/// Something that can check an input on behalf of a [`FnStage`].
pub trait StageCheck<T: ?Sized>: Send + Sync {
    /// Run the check.
    fn run(&self, input: &T) -> StageResult<ValidationOutcome>;
}

impl<T, F> StageCheck<T> for InfallibleCheck<F>
where
    T: ?Sized,
    F: Fn(&T) -> ValidationOutcome + Send + Sync,
{
    fn run(&self, input: &T) -> StageResult<ValidationOutcome> {
        Ok((self.0)(input))
    }
}

impl<T, F> StageCheck<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> StageResult<ValidationOutcome> + Send + Sync,
{
    fn run(&self, input: &T) -> StageResult<ValidationOutcome> {
        self(input)
    }
}

impl<T, F> ValidationStage<T> for FnStage<T, F>
where
    T: ?Sized,
    F: StageCheck<T>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn halts_on_failure(&self) -> bool {
        self.halts
    }

    fn check(&self, input: &T) -> StageResult<ValidationOutcome> {
        self.check.run(input)
    }
}

impl<T: ?Sized, F> fmt::Debug for FnStage<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("halts", &self.halts)
            .field("check", &"<closure>")
            .finish()
    }
}
