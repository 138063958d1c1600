//! Simple single-step workflow example.

use tsuzuki::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let workflow = Workflow::builder("load")
        .step_fn("load_data", |data: &mut Vec<String>| {
            Box::pin(async move {
                println!("Loading data...");
                data.push("sample data".to_string());
                Ok(())
            })
        })
        .build();

    let mut data = Vec::new();

    match workflow.execute(&mut data).await {
        Ok(_) => println!("Workflow completed successfully, data: {:?}", data),
        Err(error) => eprintln!("Workflow failed: {}", error),
    }

    Ok(())
}
