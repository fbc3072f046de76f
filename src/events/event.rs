//! # Lifecycle events emitted during a batch run.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: one task's execution flow (starting, stopped, failed)
//! - **Admission events**: budget trip and admission close
//! - **Shutdown events**: signal observed, grace outcome
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! task name, its position in the batch, and failure-count snapshots.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use batchvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("import")
//!     .with_index(3)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("import"));
//! assert_eq!(ev.index, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Task events ===
    /// A worker picked up a task and is about to execute it.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: position in the batch (admission order)
    TaskStarting,

    /// Task finished successfully.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: position in the batch
    TaskStopped,

    /// Task failed (returned an error or panicked).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `index`: position in the batch
    /// - `reason`: failure message
    TaskFailed,

    // === Admission events ===
    /// The failure budget was exceeded; no further tasks will be admitted.
    ///
    /// Sets:
    /// - `failures`: counter snapshot at the moment admission stopped
    BudgetTripped,

    /// Admission is closed (batch exhausted, budget tripped, or shutdown).
    /// Published exactly once per run; idle workers exit after this.
    AdmissionClosed,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All in-flight tasks finished within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not finish in time.
    GraceExceeded,
}

/// Run event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Position of the task in the batch, if applicable.
    pub index: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Failure-counter snapshot, if applicable.
    pub failures: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            index: None,
            reason: None,
            failures: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches the task's position in the batch.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a failure-counter snapshot.
    #[inline]
    pub fn with_failures(mut self, failures: usize) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
