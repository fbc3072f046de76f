//! # Task abstraction.
//!
//! This module defines the [`Task`] trait — one independent, fallible unit of
//! work — and the common handle type [`TaskRef`], an `Arc<dyn Task>` suitable
//! for sharing across the pool.
//!
//! A task runs exactly once per batch and reports its outcome as a
//! `Result<(), TaskError>`. Once started it is never interrupted: the failure
//! budget only gates the admission of *new* tasks. Any resources the task
//! touches belong to the caller, not the runner.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// # Asynchronous, fallible unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and an async
/// [`run`](Task::run) method. The pool only observes success or failure;
/// error payloads stay with the task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use batchvisor::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self) -> Result<(), TaskError> {
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task to completion.
    async fn run(&self) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;
