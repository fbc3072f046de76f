//! # Example: all_green
//!
//! Minimal example of a batch where every task succeeds.
//!
//! Demonstrates how to:
//! - Define tasks from plain closures using [`TaskFn`].
//! - Execute them on a fixed pool with the [`batchvisor::run`] shortcut.
//!
//! ## Run
//! ```bash
//! cargo run --example all_green
//! ```

use std::time::Duration;

use batchvisor::{TaskError, TaskFn, TaskRef};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Build a batch of ten independent tasks
    let tasks: Vec<TaskRef> = (0..10)
        .map(|i| {
            TaskFn::arc(format!("item-{i}"), move || async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                println!("[item-{i}] done");
                Ok::<_, TaskError>(())
            }) as TaskRef
        })
        .collect();

    // 2. Run on 3 workers; budget 0 = unlimited tolerated failures
    batchvisor::run(tasks, 3, 0).await?;
    println!("batch complete");
    Ok(())
}
