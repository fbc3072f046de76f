//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! execution. No shared mutable state is implied; if a closure needs shared
//! state, it captures an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use batchvisor::{TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("worker", || async {
//!     // do work...
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::task::Task;

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per execution.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the task and returns it as a shared handle (`Arc<Self>`).
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), TaskError> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskRef;

    #[tokio::test]
    async fn test_runs_closure_and_reports_outcome() {
        let ok: TaskRef = TaskFn::arc("ok", || async { Ok::<_, TaskError>(()) });
        assert_eq!(ok.name(), "ok");
        assert!(ok.run().await.is_ok());

        let bad: TaskRef = TaskFn::arc("bad", || async {
            Err(TaskError::Fail {
                error: "boom".into(),
            })
        });
        let err = bad.run().await.unwrap_err();
        assert_eq!(err.as_label(), "task_failed");
    }

    #[tokio::test]
    async fn test_fresh_future_per_execution() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let t: TaskRef = TaskFn::arc("counted", move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        });

        t.run().await.unwrap();
        t.run().await.unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
