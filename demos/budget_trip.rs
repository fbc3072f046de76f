//! # Example: budget_trip
//!
//! A batch where enough tasks fail to blow the failure budget, with the
//! built-in [`LogWriter`] subscriber printing the lifecycle.
//!
//! Demonstrates how to:
//! - Configure a run via [`RunConfig`] and [`Runner`].
//! - Attach subscribers for observability.
//! - Observe the admission cutoff once the budget trips.
//!
//! ## Run
//! ```bash
//! cargo run --example budget_trip --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use batchvisor::{LogWriter, RunConfig, RunError, Runner, TaskError, TaskFn, TaskRef};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = RunConfig {
        workers: 2,
        error_budget: 2,
        ..RunConfig::default()
    };

    let runner = Runner::new(cfg).with_subscribers(vec![Arc::new(LogWriter)]);

    // every third task fails
    let tasks: Vec<TaskRef> = (0..12)
        .map(|i| {
            TaskFn::arc(format!("item-{i}"), move || async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                if i % 3 == 0 {
                    return Err(TaskError::Fail {
                        error: format!("item {i} is broken"),
                    });
                }
                Ok(())
            }) as TaskRef
        })
        .collect();

    match runner.run(tasks).await {
        Ok(()) => println!("batch complete"),
        Err(RunError::BudgetExceeded { failures, budget }) => {
            println!("aborted: {failures} failures over budget {budget}");
        }
        Err(e) => println!("run error: {e}"),
    }
    Ok(())
}
