use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tsuzuki::prelude::*;

/// Shared context: every step appends its name when invoked.
#[derive(Debug, Default)]
struct Signup {
    invoked: Vec<String>,
}

#[derive(Debug)]
struct Scripted {
    name: &'static str,
    fail_with: Option<&'static str>,
}

impl Scripted {
    fn ok(name: &'static str) -> Self {
        Self {
            name,
            fail_with: None,
        }
    }

    fn failing(name: &'static str, cause: &'static str) -> Self {
        Self {
            name,
            fail_with: Some(cause),
        }
    }
}

#[async_trait]
impl Step<Signup> for Scripted {
    async fn perform(&self, ctx: &mut Signup) -> StepResult {
        ctx.invoked.push(self.name.to_string());
        tokio::task::yield_now().await;
        match self.fail_with {
            Some(cause) => Err(cause.into()),
            None => Ok(()),
        }
    }

    fn name(&self) -> StepName {
        StepName::new(self.name)
    }
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<WorkflowEvent>>>);

impl WorkflowObserver for EventLog {
    fn record(&self, event: &WorkflowEvent) {
        self.0.lock().expect("event log lock").push(event.clone());
    }
}

impl EventLog {
    fn take(&self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut *self.0.lock().expect("event log lock"))
    }
}

fn signup(steps: Vec<Scripted>, log: &EventLog) -> Workflow<Signup> {
    steps
        .into_iter()
        .fold(Workflow::<Signup>::builder("signup"), |builder, step| builder.step(step))
        .observer(log.clone())
        .build()
}

async fn reactive(
    workflow: &Workflow<Signup>,
    ctx: &mut Signup,
) -> Result<bool, WorkflowError> {
    let mut outcomes: Vec<_> = workflow.run_reactive(ctx).collect().await;
    assert_eq!(outcomes.len(), 1, "stream must emit exactly one item");
    outcomes.remove(0)
}

fn assert_step_failure(error: &WorkflowError, step: &str, cause: &str) {
    match error {
        WorkflowError::StepFailed {
            workflow,
            step_name,
            cause: source,
        } => {
            assert_eq!(workflow, "signup");
            assert_eq!(step_name.as_str(), step);
            assert_eq!(source.to_string(), cause);
        }
        other => unreachable!("expected a step failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_all_steps_succeed_in_both_modes() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::ok("persist"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    assert!(workflow.execute(&mut ctx).await.expect("future mode succeeds"));
    assert_eq!(ctx.invoked, vec!["validate", "persist", "notify"]);

    let mut ctx = Signup::default();
    assert!(reactive(&workflow, &mut ctx).await.expect("stream mode succeeds"));
    assert_eq!(ctx.invoked, vec!["validate", "persist", "notify"]);
}

#[test]
fn test_all_steps_succeed_blocking() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::ok("persist"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    assert!(workflow.run_blocking(&mut ctx).expect("blocking mode succeeds"));
    assert_eq!(ctx.invoked, vec!["validate", "persist", "notify"]);
}

#[tokio::test]
async fn test_failing_step_short_circuits_in_both_modes() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::failing("persist", "duplicate key"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    let error = workflow.execute(&mut ctx).await.unwrap_err();
    assert_step_failure(&error, "persist", "duplicate key");
    assert_eq!(ctx.invoked, vec!["validate", "persist"]);

    let mut ctx = Signup::default();
    let error = reactive(&workflow, &mut ctx).await.unwrap_err();
    assert_step_failure(&error, "persist", "duplicate key");
    assert_eq!(ctx.invoked, vec!["validate", "persist"]);
}

#[test]
fn test_failing_step_short_circuits_blocking() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::failing("persist", "duplicate key"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    let error = workflow.run_blocking(&mut ctx).unwrap_err();
    assert_step_failure(&error, "persist", "duplicate key");
    assert_eq!(ctx.invoked, vec!["validate", "persist"]);
}

#[tokio::test]
async fn test_failure_at_every_position() {
    let names = ["a", "b", "c", "d"];

    for k in 0..names.len() {
        let steps = || {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    if i == k {
                        Scripted::failing(*name, "boom")
                    } else {
                        Scripted::ok(*name)
                    }
                })
                .collect::<Vec<_>>()
        };
        let expected: Vec<String> = names[..=k].iter().map(|s| s.to_string()).collect();

        let log = EventLog::default();
        let workflow = signup(steps(), &log);

        let mut ctx = Signup::default();
        let error = workflow.execute(&mut ctx).await.unwrap_err();
        assert_step_failure(&error, names[k], "boom");
        assert_eq!(ctx.invoked, expected);

        let mut ctx = Signup::default();
        let error = reactive(&workflow, &mut ctx).await.unwrap_err();
        assert_step_failure(&error, names[k], "boom");
        assert_eq!(ctx.invoked, expected);
    }
}

#[tokio::test]
async fn test_empty_workflow_is_a_configuration_error() {
    let log = EventLog::default();
    let workflow = Workflow::<Signup>::builder("empty")
        .observer(log.clone())
        .build();

    let mut ctx = Signup::default();
    let error = workflow.execute(&mut ctx).await.unwrap_err();
    assert!(error.is_configuration());
    assert_eq!(
        error.to_string(),
        "Invalid workflow configuration: There is no defined step for empty"
    );

    let error = reactive(&workflow, &mut ctx).await.unwrap_err();
    assert!(matches!(error, WorkflowError::Configuration(_)));
    assert!(ctx.invoked.is_empty());

    assert_eq!(
        log.take(),
        vec![
            WorkflowEvent::Failed {
                workflow: "empty".to_string(),
                error: "Invalid workflow configuration: There is no defined step for empty"
                    .to_string(),
            };
            2
        ]
    );
}

#[test]
fn test_empty_workflow_blocking() {
    let workflow: Workflow<Signup> = Workflow::new("empty", Vec::new());

    let mut ctx = Signup::default();
    let error = workflow.run_blocking(&mut ctx).unwrap_err();
    assert!(error.is_configuration());
    assert!(ctx.invoked.is_empty());
}

#[tokio::test]
async fn test_modes_emit_identical_lifecycle_events() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::failing("persist", "duplicate key"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    let future_error = workflow.execute(&mut ctx).await.unwrap_err();
    let future_events = log.take();

    let mut ctx = Signup::default();
    let stream_error = reactive(&workflow, &mut ctx).await.unwrap_err();
    let stream_events = log.take();

    assert_eq!(future_error.step_name(), stream_error.step_name());
    assert_eq!(future_error.to_string(), stream_error.to_string());
    assert_eq!(future_events, stream_events);

    let workflow_name = || "signup".to_string();
    assert_eq!(
        future_events,
        vec![
            WorkflowEvent::Started {
                workflow: workflow_name(),
                steps: vec![
                    StepName::new("validate"),
                    StepName::new("persist"),
                    StepName::new("notify"),
                ],
            },
            WorkflowEvent::StepStarted {
                workflow: workflow_name(),
                step: StepName::new("validate"),
                index: 0,
            },
            WorkflowEvent::StepSucceeded {
                workflow: workflow_name(),
                step: StepName::new("validate"),
            },
            WorkflowEvent::StepStarted {
                workflow: workflow_name(),
                step: StepName::new("persist"),
                index: 1,
            },
            WorkflowEvent::StepFailed {
                workflow: workflow_name(),
                step: StepName::new("persist"),
                cause: "duplicate key".to_string(),
            },
            WorkflowEvent::Failed {
                workflow: workflow_name(),
                error: "Step 'persist' failed in workflow 'signup': duplicate key".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_modes_emit_identical_success_events() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::ok("persist"),
            Scripted::ok("notify"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    assert!(workflow.execute(&mut ctx).await.expect("future mode succeeds"));
    let future_events = log.take();

    let mut ctx = Signup::default();
    assert!(reactive(&workflow, &mut ctx).await.expect("stream mode succeeds"));
    let stream_events = log.take();

    assert_eq!(future_events, stream_events);
    assert_eq!(future_events.len(), 8);
    assert_eq!(
        stream_events.last(),
        Some(&WorkflowEvent::Succeeded {
            workflow: "signup".to_string()
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocking_mode_matches_future_mode_events() {
    let log = EventLog::default();
    let workflow = signup(vec![Scripted::ok("validate"), Scripted::ok("persist")], &log);

    let mut ctx = Signup::default();
    assert!(workflow.execute(&mut ctx).await.expect("future mode succeeds"));
    let future_events = log.take();

    let mut ctx = Signup::default();
    assert!(workflow.run_blocking(&mut ctx).expect("blocking mode succeeds"));
    let blocking_events = log.take();

    assert_eq!(future_events, blocking_events);
    assert_eq!(
        blocking_events.last(),
        Some(&WorkflowEvent::Succeeded {
            workflow: "signup".to_string()
        })
    );
}

#[tokio::test]
async fn test_identical_construction_behaves_identically() {
    let build = |log: &EventLog| {
        signup(
            vec![
                Scripted::ok("validate"),
                Scripted::failing("persist", "duplicate key"),
                Scripted::ok("notify"),
            ],
            log,
        )
    };
    let (first_log, second_log) = (EventLog::default(), EventLog::default());
    let (first, second) = (build(&first_log), build(&second_log));

    let mut first_ctx = Signup::default();
    let mut second_ctx = Signup::default();
    let first_error = first.execute(&mut first_ctx).await.unwrap_err();
    let second_error = second.execute(&mut second_ctx).await.unwrap_err();

    assert_eq!(first_error.to_string(), second_error.to_string());
    assert_eq!(first_ctx.invoked, second_ctx.invoked);
    assert_eq!(first_log.take(), second_log.take());
}

#[tokio::test]
async fn test_steps_see_earlier_mutations() {
    #[derive(Debug, Default)]
    struct Counter {
        value: u32,
        seen: Vec<u32>,
    }

    let workflow = Workflow::builder("counter")
        .step_fn("increment", |ctx: &mut Counter| {
            Box::pin(async move {
                ctx.value += 1;
                ctx.seen.push(ctx.value);
                Ok(())
            })
        })
        .step_fn("double", |ctx: &mut Counter| {
            Box::pin(async move {
                ctx.value *= 2;
                ctx.seen.push(ctx.value);
                Ok(())
            })
        })
        .observer(NoopObserver)
        .build();

    let mut ctx = Counter::default();
    assert!(workflow.execute(&mut ctx).await.expect("workflow succeeds"));
    assert_eq!(ctx.seen, vec![1, 2]);

    let mut outcome = workflow.run_reactive(&mut ctx);
    assert!(matches!(outcome.next().await, Some(Ok(true))));
    assert!(outcome.next().await.is_none());
    drop(outcome);
    assert_eq!(ctx.seen, vec![1, 2, 3, 6]);
}

#[tokio::test]
async fn test_shared_workflow_serves_concurrent_runs() {
    let workflow = Arc::new(signup(
        vec![
            Scripted::ok("validate"),
            Scripted::ok("persist"),
            Scripted::ok("notify"),
        ],
        &EventLog::default(),
    ));

    let runs: Vec<_> = (0..4)
        .map(|_| {
            let workflow = Arc::clone(&workflow);
            tokio::spawn(async move {
                let mut ctx = Signup::default();
                let result = workflow.execute(&mut ctx).await;
                (result.map_err(|e| e.to_string()), ctx.invoked)
            })
        })
        .collect();

    for run in runs {
        let (result, invoked) = run.await.expect("run task completes");
        assert_eq!(result, Ok(true));
        assert_eq!(invoked, vec!["validate", "persist", "notify"]);
    }
}

#[test]
fn test_reactive_stream_driven_without_runtime_macros() {
    let log = EventLog::default();
    let workflow = signup(
        vec![
            Scripted::ok("validate"),
            Scripted::failing("persist", "duplicate key"),
        ],
        &log,
    );

    let mut ctx = Signup::default();
    let first = tokio_test::block_on(workflow.run_reactive(&mut ctx).next());
    let error = match first {
        Some(Err(error)) => error,
        other => unreachable!("expected a failed run, got {:?}", other),
    };
    assert_step_failure(&error, "persist", "duplicate key");
    assert_eq!(ctx.invoked, vec!["validate", "persist"]);
}
