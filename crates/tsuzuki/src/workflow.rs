//! Workflow engine: an ordered list of steps and two ways to run it.
//!
//! - [`Workflow::execute`] / [`Workflow::run_blocking`] await each step in
//!   turn inside one future (or one blocking call).
//! - [`Workflow::run_reactive`] returns a lazy single-value stream that only
//!   starts step N+1 once step N has resolved.
//!
//! Both drive the same [`Run`] policy, so they agree on ordering,
//! short-circuiting, failure attribution and lifecycle events.

use crate::observer::{TracingObserver, WorkflowObserver};
use crate::run::{Next, Run};
use futures::future::{self, BoxFuture};
use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tsuzuki_core::{FnStep, Step, StepName, StepPanicked, StepResult, WorkflowError};

/// A named, ordered, immutable sequence of steps over a context `C`.
///
/// A workflow holds no per-run state, so one instance can serve any number
/// of concurrent runs, each with its own context.
pub struct Workflow<C: Send> {
    name: String,
    steps: Vec<Box<dyn Step<C>>>,
    observer: Arc<dyn WorkflowObserver>,
}

impl<C: Send> fmt::Debug for Workflow<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .finish()
    }
}

impl<C: Send> Workflow<C> {
    /// Creates a workflow that reports to the default [`TracingObserver`].
    ///
    /// An empty `steps` list is accepted here; running it fails with
    /// [`WorkflowError::Configuration`].
    pub fn new(name: impl Into<String>, steps: Vec<Box<dyn Step<C>>>) -> Self {
        Self {
            name: name.into(),
            steps,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Creates a new workflow builder.
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder<C> {
        WorkflowBuilder::new(name)
    }

    /// Returns the workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the steps in execution order.
    pub fn steps(&self) -> &[Box<dyn Step<C>>] {
        &self.steps
    }

    /// Returns the step names in execution order.
    pub fn step_names(&self) -> impl Iterator<Item = StepName> + '_ {
        self.steps.iter().map(|step| step.name())
    }

    /// Returns the number of steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if a step with the given name exists.
    pub fn has_step(&self, name: &str) -> bool {
        self.steps.iter().any(|step| step.name().as_str() == name)
    }

    pub(crate) fn observer(&self) -> &dyn WorkflowObserver {
        self.observer.as_ref()
    }

    /// Runs every step in order, awaiting each before starting the next.
    ///
    /// Resolves to `Ok(true)` when all steps succeed. The first failing
    /// step stops the run and is returned as
    /// [`WorkflowError::StepFailed`]. A step that panics is treated as a
    /// failure with a [`StepPanicked`] cause.
    ///
    /// # Examples
    ///
    /// ```
    /// use tsuzuki::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let workflow = Workflow::builder("count")
    ///     .step_fn("one", |n: &mut u32| Box::pin(async move { *n += 1; Ok(()) }))
    ///     .step_fn("two", |n: &mut u32| Box::pin(async move { *n += 1; Ok(()) }))
    ///     .observer(NoopObserver)
    ///     .build();
    ///
    /// let mut n = 0;
    /// assert!(workflow.execute(&mut n).await.expect("workflow failed"));
    /// assert_eq!(n, 2);
    /// # }
    /// ```
    pub async fn execute(&self, ctx: &mut C) -> Result<bool, WorkflowError> {
        let run = Run::begin(self)?;
        drive(run, ctx).await
    }

    /// Runs the workflow like [`execute`](Self::execute), blocking the
    /// calling thread until it finishes.
    ///
    /// Inside a multi-threaded tokio runtime the current worker is handed
    /// over with `block_in_place`; outside any runtime a current-thread
    /// runtime is built for the call. A current-thread runtime cannot be
    /// blocked, so calling this from one yields [`WorkflowError::Runtime`].
    ///
    /// The runtime is checked before the run is announced: when no runtime
    /// is usable the only event recorded is `Failed`, as for an empty
    /// workflow, and no step runs.
    pub fn run_blocking(&self, ctx: &mut C) -> Result<bool, WorkflowError> {
        Run::validate(self)?;

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                let run = Run::begin(self)?;
                tokio::task::block_in_place(|| handle.block_on(drive(run, ctx)))
            }
            Ok(_) => Err(Run::refuse(
                self,
                WorkflowError::Runtime(
                    "cannot block inside a current-thread runtime, await `execute` instead"
                        .to_string(),
                ),
            )),
            Err(_) => match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    let run = Run::begin(self)?;
                    runtime.block_on(drive(run, ctx))
                }
                Err(e) => Err(Run::refuse(self, WorkflowError::Runtime(e.to_string()))),
            },
        }
    }

    /// Runs the workflow as a stream that yields exactly one item.
    ///
    /// Nothing happens until the stream is polled. Each step is started only
    /// after the previous one resolved successfully; the first failure ends
    /// the stream with that error and later steps are never started. A step
    /// that panics ends the stream with a [`StepPanicked`] cause, exactly as
    /// in [`execute`](Self::execute).
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::StreamExt;
    /// use tsuzuki::prelude::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let workflow = Workflow::builder("count")
    ///     .step_fn("one", |n: &mut u32| Box::pin(async move { *n += 1; Ok(()) }))
    ///     .observer(NoopObserver)
    ///     .build();
    ///
    /// let mut n = 0;
    /// let outcome = workflow.run_reactive(&mut n).next().await;
    /// assert!(matches!(outcome, Some(Ok(true))));
    /// assert_eq!(n, 1);
    /// # }
    /// ```
    pub fn run_reactive<'a>(
        &'a self,
        ctx: &'a mut C,
    ) -> BoxStream<'a, Result<bool, WorkflowError>> {
        stream::unfold(Some(Chain::Idle(self, ctx)), |chain| async move {
            let Some(chain) = chain else {
                return None;
            };
            let (run, ctx) = match chain {
                Chain::Idle(workflow, ctx) => match Run::begin(workflow) {
                    Ok(run) => (run, ctx),
                    Err(error) => return Some((Some(Err(error)), None)),
                },
                Chain::Linked(run, ctx) => (run, ctx),
            };

            match run.advance() {
                Next::Perform(mut run, step) => {
                    let outcome = perform_caught(step, ctx).await;
                    run.record(step.name(), outcome);
                    Some((None, Some(Chain::Linked(run, ctx))))
                }
                Next::Done(result) => Some((Some(result), None)),
            }
        })
        .filter_map(future::ready)
        .boxed()
    }
}

/// Position of a reactive run between polls.
enum Chain<'a, C: Send> {
    /// Not yet subscribed; validation has not happened.
    Idle(&'a Workflow<C>, &'a mut C),
    /// Waiting to link the next step.
    Linked(Run<'a, C>, &'a mut C),
}

async fn drive<C: Send>(mut run: Run<'_, C>, ctx: &mut C) -> Result<bool, WorkflowError> {
    loop {
        match run.advance() {
            Next::Perform(mut next, step) => {
                let outcome = perform_caught(step, ctx).await;
                next.record(step.name(), outcome);
                run = next;
            }
            Next::Done(result) => return result,
        }
    }
}

async fn perform_caught<C: Send>(step: &dyn Step<C>, ctx: &mut C) -> StepResult {
    match AssertUnwindSafe(step.perform(ctx)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(StepPanicked::from_payload(payload.as_ref()).into()),
    }
}

/// Builder for constructing [`Workflow`] instances.
pub struct WorkflowBuilder<C: Send> {
    name: String,
    steps: Vec<Box<dyn Step<C>>>,
    observer: Arc<dyn WorkflowObserver>,
}

impl<C: Send> WorkflowBuilder<C> {
    /// Creates a builder for a workflow named `name` with no steps.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Appends a step. Steps run in the order they are added.
    pub fn step<S: Step<C> + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends an already boxed step.
    pub fn boxed_step(mut self, step: Box<dyn Step<C>>) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a closure-backed step.
    pub fn step_fn<F>(self, name: impl Into<StepName>, action: F) -> Self
    where
        C: 'static,
        F: for<'c> Fn(&'c mut C) -> BoxFuture<'c, StepResult> + Send + Sync + 'static,
    {
        self.step(FnStep::new(name, action))
    }

    /// Sets the observer that receives lifecycle events.
    pub fn observer<O: WorkflowObserver + 'static>(self, observer: O) -> Self {
        self.shared_observer(Arc::new(observer))
    }

    /// Sets an observer shared with other workflows.
    pub fn shared_observer(mut self, observer: Arc<dyn WorkflowObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Builds the workflow.
    pub fn build(self) -> Workflow<C> {
        Workflow {
            name: self.name,
            steps: self.steps,
            observer: self.observer,
        }
    }
}
