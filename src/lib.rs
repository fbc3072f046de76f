//! # batchvisor
//!
//! **Batchvisor** is a bounded concurrent batch runner for Rust.
//!
//! It executes a finite batch of independent, fallible async tasks on a
//! fixed-size pool of workers and stops admitting new work once a configured
//! failure budget is exceeded. The crate is designed as a building block for
//! batch jobs, migrations, crawlers, and bulk I/O.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskRef    │   │   TaskRef    │   │   TaskRef    │
//!     │ (batch #0)   │   │ (batch #1)   │   │ (batch #N)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (per-run orchestrator)                                    │
//! │  - Governor (shared failure counter + budget decision)            │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - AliveTracker (in-flight tasks, for stuck reporting)            │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!   dispatch() ──► mpsc::channel(1) ──┬──► worker 1 ──┐
//!   (batch order,   (one-at-a-time    ├──► worker 2 ──┼── run_once()
//!    budget gate)    handoff)         └──► worker W ──┘   → report to
//!                                                           Governor
//! ```
//!
//! ### Lifecycle
//! ```text
//! Runner::run(tasks)
//!   ├─► validate config (workers >= 1)
//!   ├─► spawn dispatcher + W workers
//!   │
//!   │   dispatcher:                      worker (× W):
//!   │     for task in batch:               loop:
//!   │       budget exceeded? → stop          budget exceeded? → exit
//!   │       send task (backpressure)         pull next (None → exit)
//!   │     close channel (broadcast)          publish TaskStarting
//!   │                                        run_once → Stopped/Failed
//!   │                                        failure? → record before next
//!   │
//!   ├─► await all (or OS signal → close admission, wait grace)
//!   └─► verdict: failures > budget → BudgetExceeded, else Ok
//! ```
//!
//! ## Features
//! | Area              | Description                                                          | Key types / traits                |
//! |-------------------|----------------------------------------------------------------------|-----------------------------------|
//! | **Run API**       | Execute a batch with a pool width and failure budget.                | [`run`], [`Runner`], [`RunConfig`]|
//! | **Tasks**         | Define tasks as trait impls or plain closures.                       | [`Task`], [`TaskFn`], [`TaskRef`] |
//! | **Errors**        | Typed errors for the run and for task executions.                    | [`RunError`], [`TaskError`]       |
//! | **Subscriber API**| Hook into run lifecycle events (logging, metrics, custom hooks).     | [`Subscribe`], [`Event`]          |
//!
//! ## Semantics worth knowing
//! - `error_budget == 0` means **unlimited**: failures are counted but never
//!   abort the run.
//! - With a non-zero budget the run fails once failures **exceed** the
//!   budget (`failures == budget` still completes), and admission stops at
//!   that same boundary.
//! - Tasks already handed to a worker always run to completion; neither the
//!   budget nor a shutdown signal interrupts in-flight work.
//! - Admission order is the batch order; completion order is not.
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use batchvisor::{RunError, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tasks: Vec<TaskRef> = (0..10)
//!         .map(|i| {
//!             TaskFn::arc(format!("item-{i}"), move || async move {
//!                 if i == 3 {
//!                     return Err(TaskError::Fail { error: "bad item".into() });
//!                 }
//!                 Ok(())
//!             }) as TaskRef
//!         })
//!         .collect();
//!
//!     // 4 workers, tolerate up to 2 failures
//!     match batchvisor::run(tasks, 4, 2).await {
//!         Ok(()) => println!("batch done"),
//!         Err(RunError::BudgetExceeded { failures, budget }) => {
//!             eprintln!("aborted: {failures} failures over budget {budget}");
//!         }
//!         Err(e) => eprintln!("run error: {e}"),
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::config::RunConfig;
pub use crate::core::{Runner, run};
pub use crate::error::{RunError, TaskError};
pub use crate::events::{Bus, Event, EventKind};
pub use crate::subscribers::{Subscribe, SubscriberSet};
pub use crate::tasks::{Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use crate::subscribers::LogWriter;
