//! Error types used by the batch runner and by tasks.
//!
//! Two enums, split by origin:
//!
//! - [`RunError`] — errors raised by the run itself (bad configuration,
//!   failure budget exceeded, shutdown grace exceeded).
//! - [`TaskError`] — errors raised by individual task executions.
//!
//! Both provide `as_label` / `as_message` helpers for logging/metrics.
//! Individual task errors never cross the run boundary; only the aggregate
//! verdict does.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a batch run.
///
/// These represent terminal outcomes of the run as a whole, never of a
/// single task. A run always returns one of these (or `Ok`); it never
/// terminates the hosting process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The configuration was rejected before anything was spawned.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable rejection reason.
        reason: String,
    },

    /// More task failures were observed than the budget tolerates.
    ///
    /// Raised only after every worker has exited; it is an aggregate
    /// signal, not tied to any specific task.
    #[error("failure budget exceeded: {failures} failures over budget {budget}")]
    BudgetExceeded {
        /// Total failures reported by the pool.
        failures: usize,
        /// The configured budget that was exceeded.
        budget: usize,
    },

    /// Shutdown grace period elapsed with tasks still running.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not finish in time.
        stuck: Vec<String>,
    },
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use batchvisor::RunError;
    ///
    /// let err = RunError::BudgetExceeded { failures: 3, budget: 2 };
    /// assert_eq!(err.as_label(), "run_budget_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::InvalidConfig { .. } => "run_invalid_config",
            RunError::BudgetExceeded { .. } => "run_budget_exceeded",
            RunError::GraceExceeded { .. } => "run_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunError::InvalidConfig { reason } => format!("invalid configuration: {reason}"),
            RunError::BudgetExceeded { failures, budget } => {
                format!("budget exceeded: failures={failures} budget={budget}")
            }
            RunError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

/// # Errors produced by task execution.
///
/// A task either returns [`TaskError::Fail`] itself, or panics and gets
/// [`TaskError::Panicked`] recorded on its behalf. Both count as exactly one
/// failure against the budget.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task execution panicked; the panic was caught by the worker.
    #[error("execution panicked: {panic}")]
    Panicked {
        /// The captured panic payload, if it was a string.
        panic: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use batchvisor::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { panic } => format!("panic: {panic}"),
        }
    }
}
