//! Sequencing policy shared by both execution modes.
//!
//! A [`Run`] folds over the workflow's steps, stopping at the first failure.
//! It never awaits anything itself: an adapter asks it for the next step,
//! drives that step however it likes, and hands the outcome back. All
//! lifecycle events are emitted here so the adapters cannot diverge.

use crate::observer::WorkflowEvent;
use crate::workflow::Workflow;
use tsuzuki_core::{Step, StepName, StepResult, WorkflowError};

/// Where a run is. Transitions only move forward.
#[derive(Debug)]
pub(crate) enum RunState {
    NotStarted,
    /// Step `i` is the next one to run (or is running).
    Running(usize),
    Succeeded,
    Failed(WorkflowError),
}

/// What the adapter should do next.
pub(crate) enum Next<'a, C: Send> {
    /// Perform `step` against the context, then [`Run::record`] its outcome.
    Perform(Run<'a, C>, &'a dyn Step<C>),
    /// The run reached a terminal state.
    Done(Result<bool, WorkflowError>),
}

/// One in-flight workflow run.
pub(crate) struct Run<'a, C: Send> {
    workflow: &'a Workflow<C>,
    state: RunState,
}

impl<'a, C: Send> Run<'a, C> {
    /// Validates the workflow and announces the run.
    ///
    /// An empty workflow is rejected here, before any step is touched.
    pub(crate) fn begin(workflow: &'a Workflow<C>) -> Result<Self, WorkflowError> {
        Self::validate(workflow)?;

        workflow.observer().record(&WorkflowEvent::Started {
            workflow: workflow.name().to_string(),
            steps: workflow.step_names().collect(),
        });

        Ok(Self {
            workflow,
            state: RunState::NotStarted,
        })
    }

    /// Rejects an empty workflow without announcing a run.
    pub(crate) fn validate(workflow: &Workflow<C>) -> Result<(), WorkflowError> {
        if workflow.steps().is_empty() {
            return Err(Self::refuse(workflow, WorkflowError::no_steps(workflow.name())));
        }
        Ok(())
    }

    /// Reports a run that never started: a single `Failed` event, no `Started`.
    pub(crate) fn refuse(workflow: &Workflow<C>, error: WorkflowError) -> WorkflowError {
        workflow.observer().record(&WorkflowEvent::Failed {
            workflow: workflow.name().to_string(),
            error: error.to_string(),
        });
        error
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &RunState {
        &self.state
    }

    /// Moves the run forward: hands out the next step, or finishes.
    pub(crate) fn advance(mut self) -> Next<'a, C> {
        let index = match self.state {
            RunState::NotStarted => 0,
            RunState::Running(index) => index,
            RunState::Succeeded => {
                self.emit(WorkflowEvent::Succeeded {
                    workflow: self.workflow.name().to_string(),
                });
                return Next::Done(Ok(true));
            }
            RunState::Failed(error) => {
                self.workflow.observer().record(&WorkflowEvent::Failed {
                    workflow: self.workflow.name().to_string(),
                    error: error.to_string(),
                });
                return Next::Done(Err(error));
            }
        };

        // `begin` rejects empty workflows and `record` never moves past the
        // last step, so `index` is always in bounds.
        let workflow = self.workflow;
        let step = &*workflow.steps()[index];
        self.state = RunState::Running(index);
        self.emit(WorkflowEvent::StepStarted {
            workflow: workflow.name().to_string(),
            step: step.name(),
            index,
        });
        Next::Perform(self, step)
    }

    /// Records the outcome of the step handed out by the last `advance`.
    pub(crate) fn record(&mut self, step_name: StepName, outcome: StepResult) {
        let RunState::Running(index) = self.state else {
            return;
        };
        let workflow = self.workflow.name().to_string();

        match outcome {
            Ok(()) => {
                self.emit(WorkflowEvent::StepSucceeded {
                    workflow,
                    step: step_name,
                });
                self.state = if index + 1 < self.workflow.steps().len() {
                    RunState::Running(index + 1)
                } else {
                    RunState::Succeeded
                };
            }
            Err(cause) => {
                self.emit(WorkflowEvent::StepFailed {
                    workflow: workflow.clone(),
                    step: step_name.clone(),
                    cause: cause.to_string(),
                });
                self.state = RunState::Failed(WorkflowError::StepFailed {
                    workflow,
                    step_name,
                    cause,
                });
            }
        }
    }

    fn emit(&self, event: WorkflowEvent) {
        self.workflow.observer().record(&event);
    }
}
