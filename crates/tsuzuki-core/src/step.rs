//! Step contract and step naming.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Debug};

/// Boxed cause carried by a failed step.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Outcome of a single step: `Ok(())` on success, the cause on failure.
pub type StepResult = Result<(), BoxError>;

/// Human-readable step name.
///
/// Used for logging and failure attribution only. Two steps in the same
/// workflow may share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the step name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StepName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A unit of work run by a workflow against a shared context `C`.
///
/// Steps of one workflow run share the same live context instance, so a
/// step sees whatever earlier steps wrote into it. The engine calls
/// [`perform`](Step::perform) at most once per run and never retries it.
///
/// # Examples
///
/// ```
/// use tsuzuki_core::{Step, StepName, StepResult};
/// use async_trait::async_trait;
///
/// #[derive(Debug, Default)]
/// struct Signup {
///     email: String,
///     validated: bool,
/// }
///
/// #[derive(Debug)]
/// struct ValidateEmail;
///
/// #[async_trait]
/// impl Step<Signup> for ValidateEmail {
///     async fn perform(&self, ctx: &mut Signup) -> StepResult {
///         if !ctx.email.contains('@') {
///             return Err(format!("invalid email: {}", ctx.email).into());
///         }
///         ctx.validated = true;
///         Ok(())
///     }
///
///     fn name(&self) -> StepName {
///         StepName::new("validate")
///     }
/// }
/// ```
#[async_trait]
pub trait Step<C: Send>: Send + Sync + Debug {
    /// Runs the step against the shared context.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - The step succeeded; the workflow continues
    /// - `Err(cause)` - The step failed; the workflow stops here
    async fn perform(&self, ctx: &mut C) -> StepResult;

    /// Returns the step name.
    fn name(&self) -> StepName;
}

/// Signature of the closure behind a [`FnStep`].
pub type StepFn<C> = dyn for<'c> Fn(&'c mut C) -> BoxFuture<'c, StepResult> + Send + Sync;

/// A step backed by a closure.
///
/// Handy for small steps that do not deserve their own type.
///
/// ```
/// use tsuzuki_core::{step_fn, Step};
///
/// let step = step_fn("bump", |count: &mut u32| {
///     Box::pin(async move {
///         *count += 1;
///         Ok(())
///     })
/// });
/// assert_eq!(Step::<u32>::name(&step), "bump");
/// ```
pub struct FnStep<C> {
    name: StepName,
    action: Box<StepFn<C>>,
}

impl<C> FnStep<C> {
    /// Creates a step named `name` that runs `action`.
    pub fn new<F>(name: impl Into<StepName>, action: F) -> Self
    where
        F: for<'c> Fn(&'c mut C) -> BoxFuture<'c, StepResult> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }
}

impl<C> Debug for FnStep<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<C: Send> Step<C> for FnStep<C> {
    async fn perform(&self, ctx: &mut C) -> StepResult {
        (self.action)(ctx).await
    }

    fn name(&self) -> StepName {
        self.name.clone()
    }
}

/// Shorthand for [`FnStep::new`].
pub fn step_fn<C, F>(name: impl Into<StepName>, action: F) -> FnStep<C>
where
    F: for<'c> Fn(&'c mut C) -> BoxFuture<'c, StepResult> + Send + Sync + 'static,
{
    FnStep::new(name, action)
}
