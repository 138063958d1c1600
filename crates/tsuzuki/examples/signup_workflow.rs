//! User signup workflow run in every execution mode.
//!
//! Demonstrates:
//! - Steps sharing one mutable context
//! - Future, blocking and stream execution of the same workflow
//! - Short-circuiting when a step fails (duplicate registration)

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tsuzuki::prelude::*;

#[derive(Debug, Default)]
struct Registration {
    email: String,
    normalized: Option<String>,
    user_id: Option<u64>,
    notified: bool,
}

impl Registration {
    fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Default::default()
        }
    }
}

// Step 1: Validation
#[derive(Debug)]
struct ValidateStep;

#[async_trait]
impl Step<Registration> for ValidateStep {
    async fn perform(&self, ctx: &mut Registration) -> StepResult {
        let email = ctx.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(format!("invalid email address: {}", ctx.email).into());
        }
        ctx.normalized = Some(email);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new("validate")
    }
}

// Step 2: Persistence against an in-memory user table
#[derive(Debug, Default)]
struct PersistStep {
    users: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl Step<Registration> for PersistStep {
    async fn perform(&self, ctx: &mut Registration) -> StepResult {
        let email = ctx.normalized.clone().ok_or("email was not validated")?;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut users = self.users.lock().map_err(|e| e.to_string())?;
        if !users.insert(email) {
            return Err("duplicate key".into());
        }
        ctx.user_id = Some(users.len() as u64);
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new("persist")
    }
}

// Step 3: Notification
#[derive(Debug)]
struct NotifyStep;

#[async_trait]
impl Step<Registration> for NotifyStep {
    async fn perform(&self, ctx: &mut Registration) -> StepResult {
        let user_id = ctx.user_id.ok_or("user was not persisted")?;
        println!("Welcome mail queued for user #{}", user_id);
        ctx.notified = true;
        Ok(())
    }

    fn name(&self) -> StepName {
        StepName::new("notify")
    }
}

fn report(mode: &str, result: Result<bool, WorkflowError>, ctx: &Registration) {
    match result {
        Ok(done) => println!("[{}] {} -> completed: {} ({:?})", mode, ctx.email, done, ctx),
        Err(error) => eprintln!("[{}] {} -> {}", mode, ctx.email, error),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let workflow = Workflow::builder("signup")
        .step(ValidateStep)
        .step(PersistStep::default())
        .step(NotifyStep)
        .build();

    let mut alice = Registration::new("Alice@Example.com");
    let result = workflow.execute(&mut alice).await;
    report("future", result, &alice);

    let mut bob = Registration::new("bob@example.com");
    let result = workflow.run_blocking(&mut bob);
    report("blocking", result, &bob);

    let mut carol = Registration::new("carol@example.com");
    let outcome = workflow.run_reactive(&mut carol).next().await;
    if let Some(result) = outcome {
        report("stream", result, &carol);
    }

    // Registering the same address again stops at `persist`; `notify` never runs.
    let mut again = Registration::new("alice@example.com");
    let result = workflow.execute(&mut again).await;
    report("future", result, &again);

    let mut broken = Registration::new("not-an-email");
    let outcome = workflow.run_reactive(&mut broken).next().await;
    if let Some(result) = outcome {
        report("stream", result, &broken);
    }

    let empty: Workflow<Registration> = Workflow::new("empty", Vec::new());
    let mut nobody = Registration::new("nobody@example.com");
    report("future", empty.execute(&mut nobody).await, &nobody);

    Ok(())
}
