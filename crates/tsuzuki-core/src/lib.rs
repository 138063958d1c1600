//! Step contract and error types for the tsuzuki workflow engine.
//!
//! This crate does not depend on tokio. Library authors depend on it to
//! implement steps; the engine lives in the `tsuzuki` crate.
//!
//! # Core Types
//!
//! - [`Step`] - A named unit of work run against a shared context
//! - [`StepResult`] - Success, or failure with a cause
//! - [`FnStep`] - A step backed by a closure
//! - [`WorkflowError`] - Errors surfaced by a workflow run

mod error;
mod step;

pub use error::{StepPanicked, WorkflowError};
pub use step::{step_fn, BoxError, FnStep, Step, StepFn, StepName, StepResult};
