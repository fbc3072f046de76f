//! # Worker: pull, execute, report.
//!
//! A worker repeatedly pulls the next admitted task from the shared handoff
//! queue, executes it via [`run_once`], and reports failures to the
//! [`Governor`] before pulling again. Exactly `workers` of these loops run
//! per batch; a worker never executes two tasks at once.
//!
//! ## Event flow
//! ```text
//! Success:
//!   task.run() → Ok(())            → publish TaskStopped
//!
//! Failure:
//!   task.run() → Err(Fail)         → publish TaskFailed
//!
//! Panic:
//!   task.run() → panic (caught)    → publish TaskFailed (Panicked)
//! ```
//!
//! ## Rules
//! - `run_once` publishes **exactly one** terminal event per task.
//! - A failure is reported to the governor **before** the next pull.
//! - Panics are caught per task; a panicking task never takes its worker
//!   down and counts as exactly one failure.
//! - Workers exit when the queue is closed and drained, or — fast path —
//!   when the budget is already blown. The dispatcher stays the
//!   authoritative gate either way.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};

use crate::core::alive::AliveTracker;
use crate::core::dispatcher::Admitted;
use crate::core::governor::Governor;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::Task;

/// Handoff queue end shared by all workers of one pool.
///
/// The mutex makes the single receiver safe for many competing workers: one
/// worker at a time awaits the next task, the rest queue on the lock. When
/// the sender drops, every worker that reaches `recv` observes `None`.
pub(crate) type SharedQueue = Arc<Mutex<mpsc::Receiver<Admitted>>>;

/// One worker loop. Runs until the queue is closed and drained.
pub(crate) async fn worker_loop(
    queue: SharedQueue,
    governor: Arc<Governor>,
    alive: Arc<AliveTracker>,
    bus: Bus,
) {
    loop {
        // Fast path: don't pull new work once the budget is blown.
        if governor.exceeded() {
            break;
        }

        // The guard must not outlive the pull: executing while holding the
        // lock would serialize the whole pool.
        let next = { queue.lock().await.recv().await };
        let Some(Admitted { index, task }) = next else {
            break;
        };

        bus.publish(
            Event::new(EventKind::TaskStarting)
                .with_task(task.name())
                .with_index(index),
        );

        alive.insert(index, task.name()).await;
        let res = run_once(task.as_ref(), index, &bus).await;
        alive.remove(index).await;

        if res.is_err() {
            governor.record_failure();
        }
    }
}

/// Executes one task, publishing its terminal event.
///
/// Panics are caught and mapped to [`TaskError::Panicked`] so the worker
/// loop survives and the failure is counted like any other.
pub(crate) async fn run_once<T: Task + ?Sized>(
    task: &T,
    index: usize,
    bus: &Bus,
) -> Result<(), TaskError> {
    match std::panic::AssertUnwindSafe(task.run()).catch_unwind().await {
        Ok(Ok(())) => {
            publish_stopped(bus, task.name(), index);
            Ok(())
        }
        Ok(Err(e)) => {
            publish_failed(bus, task.name(), index, &e);
            Err(e)
        }
        Err(payload) => {
            let e = TaskError::Panicked {
                panic: panic_message(payload.as_ref()),
            };
            publish_failed(bus, task.name(), index, &e);
            Err(e)
        }
    }
}

/// Extracts a printable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Publishes `TaskStopped` (successful completion).
fn publish_stopped(bus: &Bus, name: &str, index: usize) {
    bus.publish(
        Event::new(EventKind::TaskStopped)
            .with_task(name)
            .with_index(index),
    );
}

/// Publishes `TaskFailed` with error details.
fn publish_failed(bus: &Bus, name: &str, index: usize, err: &TaskError) {
    bus.publish(
        Event::new(EventKind::TaskFailed)
            .with_task(name)
            .with_index(index)
            .with_reason(err.to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{TaskFn, TaskRef};
    use async_trait::async_trait;

    struct Bomb;

    #[async_trait]
    impl Task for Bomb {
        fn name(&self) -> &str {
            "bomb"
        }

        async fn run(&self) -> Result<(), TaskError> {
            panic!("kaboom")
        }
    }

    #[tokio::test]
    async fn test_run_once_publishes_single_terminal_event() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let ok: TaskRef = TaskFn::arc("fine", || async { Ok::<_, TaskError>(()) });
        assert!(run_once(ok.as_ref(), 0, &bus).await.is_ok());

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskStopped);
        assert_eq!(ev.index, Some(0));
        assert!(rx.try_recv().is_err(), "exactly one terminal event");
    }

    #[tokio::test]
    async fn test_run_once_reports_failure_with_reason() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let bad: TaskRef = TaskFn::arc("bad", || async {
            Err(TaskError::Fail {
                error: "refused".into(),
            })
        });
        let err = run_once(bad.as_ref(), 3, &bus).await.unwrap_err();
        assert_eq!(err.as_label(), "task_failed");

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert!(ev.reason.as_deref().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn test_run_once_catches_panics() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        let bomb: TaskRef = Arc::new(Bomb);
        let err = run_once(bomb.as_ref(), 1, &bus).await.unwrap_err();
        assert_eq!(err.as_label(), "task_panicked");
        assert!(err.as_message().contains("kaboom"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskFailed);
    }

    #[tokio::test]
    async fn test_worker_drains_queue_and_counts_failures() {
        let bus = Bus::new(64);
        let governor = Arc::new(Governor::new(0));
        let alive = Arc::new(AliveTracker::new());
        let (tx, rx) = mpsc::channel(1);
        let queue: SharedQueue = Arc::new(Mutex::new(rx));

        let worker = tokio::spawn(worker_loop(
            queue,
            Arc::clone(&governor),
            alive,
            bus.clone(),
        ));

        for index in 0..4 {
            let task: TaskRef = if index % 2 == 0 {
                TaskFn::arc("even", || async { Ok::<_, TaskError>(()) })
            } else {
                TaskFn::arc("odd", || async {
                    Err(TaskError::Fail {
                        error: "odd".into(),
                    })
                })
            };
            tx.send(Admitted { index, task }).await.unwrap();
        }
        drop(tx);
        worker.await.unwrap();

        assert_eq!(governor.failures(), 2);
    }
}
