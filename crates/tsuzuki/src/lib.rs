//! A minimal sequential workflow engine.
//!
//! A [`Workflow`] owns a name and an ordered list of [`Step`]s. Running it
//! performs each step against one shared context, in order, and stops at the
//! first failure. The whole run resolves to `true` or to a
//! [`WorkflowError`] naming the workflow, the failing step and its cause.
//!
//! Two execution modes share one sequencing policy:
//!
//! - **Future**: [`Workflow::execute`] awaits each step in turn;
//!   [`Workflow::run_blocking`] does the same behind a single blocking call.
//! - **Stream**: [`Workflow::run_reactive`] returns a lazy single-value
//!   stream for callers living in a non-blocking pipeline.
//!
//! Lifecycle events go to an injected [`WorkflowObserver`]; the default
//! [`TracingObserver`] renders them with `tracing`.
//!
//! # Example
//!
//! ```rust
//! use tsuzuki::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug, Default)]
//! struct Signup {
//!     email: String,
//!     stored: bool,
//! }
//!
//! #[derive(Debug)]
//! struct Persist;
//!
//! #[async_trait]
//! impl Step<Signup> for Persist {
//!     async fn perform(&self, ctx: &mut Signup) -> StepResult {
//!         ctx.stored = true;
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> StepName {
//!         StepName::new("persist")
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let workflow = Workflow::builder("signup").step(Persist).build();
//!
//! let mut ctx = Signup { email: "a@b.c".to_string(), ..Default::default() };
//! assert!(workflow.execute(&mut ctx).await.expect("workflow failed"));
//! assert!(ctx.stored);
//! # }
//! ```

mod observer;
mod run;
mod workflow;

// Re-export core types
pub use tsuzuki_core::*;

pub use observer::{NoopObserver, TracingObserver, WorkflowEvent, WorkflowObserver};
pub use workflow::{Workflow, WorkflowBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        step_fn, BoxError, FnStep, NoopObserver, Step, StepName, StepPanicked, StepResult,
        TracingObserver, Workflow, WorkflowBuilder, WorkflowError, WorkflowEvent,
        WorkflowObserver,
    };
}
