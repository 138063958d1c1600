//! Lifecycle events and the observers that record them.

use serde::Serialize;
use tracing::{debug, error, info, warn};
use tsuzuki_core::StepName;

/// A lifecycle event of one workflow run.
///
/// Both execution modes report the same events in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// The run began; `steps` lists the declared steps in order.
    Started {
        workflow: String,
        steps: Vec<StepName>,
    },
    /// A step is about to run. `index` is 0-based.
    StepStarted {
        workflow: String,
        step: StepName,
        index: usize,
    },
    StepSucceeded {
        workflow: String,
        step: StepName,
    },
    StepFailed {
        workflow: String,
        step: StepName,
        cause: String,
    },
    /// Every step succeeded.
    Succeeded { workflow: String },
    /// The run failed, either on a step or on configuration.
    Failed { workflow: String, error: String },
}

impl WorkflowEvent {
    /// Returns the workflow the event belongs to.
    pub fn workflow(&self) -> &str {
        match self {
            Self::Started { workflow, .. }
            | Self::StepStarted { workflow, .. }
            | Self::StepSucceeded { workflow, .. }
            | Self::StepFailed { workflow, .. }
            | Self::Succeeded { workflow }
            | Self::Failed { workflow, .. } => workflow,
        }
    }
}

/// Receives lifecycle events from workflow runs.
///
/// Observers are purely observational: nothing they do affects control
/// flow. A workflow may be run concurrently, so `record` can be called from
/// several runs at once.
pub trait WorkflowObserver: Send + Sync {
    /// Records one event.
    fn record(&self, event: &WorkflowEvent);
}

/// Renders events through `tracing`. This is the default observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl WorkflowObserver for TracingObserver {
    fn record(&self, event: &WorkflowEvent) {
        match event {
            WorkflowEvent::Started { workflow, steps } => {
                info!(
                    workflow = %workflow,
                    step_count = steps.len(),
                    "Workflow '{}' started",
                    workflow
                );
                for step in steps {
                    info!(workflow = %workflow, "- {}", step);
                }
            }
            WorkflowEvent::StepStarted {
                workflow,
                step,
                index,
            } => {
                debug!(workflow = %workflow, step = %step, index, "Step '{}' started", step);
            }
            WorkflowEvent::StepSucceeded { workflow, step } => {
                info!(workflow = %workflow, step = %step, "Step '{}' completed successfully", step);
            }
            WorkflowEvent::StepFailed {
                workflow,
                step,
                cause,
            } => {
                warn!(workflow = %workflow, step = %step, "Step '{}' failed: {}", step, cause);
            }
            WorkflowEvent::Succeeded { workflow } => {
                info!(workflow = %workflow, "Workflow '{}' completed successfully", workflow);
            }
            WorkflowEvent::Failed { workflow, error } => {
                error!(workflow = %workflow, "Workflow '{}' failed: {}", workflow, error);
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {
    fn record(&self, _event: &WorkflowEvent) {}
}
