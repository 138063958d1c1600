//! Workflow error types.

use crate::step::{BoxError, StepName};
use thiserror::Error;

/// Errors surfaced by a workflow run.
///
/// A run either resolves to `true` or to one of these. A failing step is
/// always wrapped in [`WorkflowError::StepFailed`], which records the
/// workflow, the step and the original cause.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WorkflowError {
    /// The workflow cannot run as configured, e.g. it has no steps.
    ///
    /// Raised before any step executes.
    #[error("Invalid workflow configuration: {0}")]
    Configuration(String),

    /// A step resolved to failure; no later step was run.
    #[error("Step '{step_name}' failed in workflow '{workflow}': {cause}")]
    StepFailed {
        /// The workflow the step belongs to.
        workflow: String,
        /// The name of the step that failed.
        step_name: StepName,
        /// The cause reported by the step.
        #[source]
        cause: BoxError,
    },

    /// No runtime was available to block on.
    #[error("Blocking runtime unavailable: {0}")]
    Runtime(String),
}

impl WorkflowError {
    /// Builds the error raised for a workflow without steps.
    pub fn no_steps(workflow: &str) -> Self {
        Self::Configuration(format!("There is no defined step for {}", workflow))
    }

    /// Returns the failing step, if a step failed.
    pub fn step_name(&self) -> Option<&StepName> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }

    /// Returns the workflow a step failed in, if a step failed.
    pub fn workflow(&self) -> Option<&str> {
        match self {
            Self::StepFailed { workflow, .. } => Some(workflow),
            _ => None,
        }
    }

    /// Returns `true` for configuration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Cause recorded when a step panics instead of returning an outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("step panicked: {message}")]
pub struct StepPanicked {
    /// The panic payload, when it was a string.
    pub message: String,
}

impl StepPanicked {
    /// Extracts a message from a panic payload.
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}
