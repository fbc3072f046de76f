//! # Runner: wires the governor, dispatcher, and worker pool for one batch.
//!
//! The [`Runner`] owns the run configuration and the user-provided
//! subscribers. Each [`Runner::run`] call builds a fresh bus, governor,
//! dispatcher, and pool, drives them to completion, and tears everything
//! down before returning — no state survives across calls.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<TaskRef>  ──►  Runner::run(cfg, subscribers)
//!
//! Preparation:
//!   - RunConfig::validate()              (workers >= 1, or nothing spawns)
//!   - Bus + SubscriberSet + listener     (observability fan-out)
//!   - Governor(error_budget)             (shared failure counter)
//!   - mpsc::channel(1)                   (one-at-a-time handoff)
//!
//! Spawn into a JoinSet:
//!   dispatch()     worker_loop() × workers
//!       │                │
//!       └── Admitted ───►┘   pull → run_once → record_failure
//!
//! Completion path:
//!   all joined ──► governor verdict ──► Ok(()) | Err(BudgetExceeded)
//!
//! Shutdown path:
//!   OS signal ──► publish ShutdownRequested
//!             ──► gate.cancel()           (dispatcher stops feeding)
//!             ──► wait up to cfg.grace:
//!                    ├─ all joined  → AllStoppedWithin → normal verdict
//!                    └─ still busy  → GraceExceeded(stuck names)
//! ```
//!
//! ## Rules
//! - `run` returns only after the dispatcher, every pool worker, the bus
//!   listener, and every subscriber worker have been joined (or, on an
//!   exceeded grace, aborted). Nothing keeps running in the background.
//! - The budget verdict is read once, after the pool has fully stopped, so
//!   it observes every recorded failure.
//! - An empty batch completes immediately.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::core::alive::AliveTracker;
use crate::core::dispatcher::{Admitted, dispatch};
use crate::core::governor::Governor;
use crate::core::shutdown;
use crate::core::worker::{SharedQueue, worker_loop};
use crate::error::RunError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::TaskRef;

/// Executes one batch with the given pool width and failure budget.
///
/// Convenience wrapper over [`Runner`] with default bus capacity and grace,
/// and no subscribers.
///
/// # Example
/// ```
/// use batchvisor::{TaskError, TaskFn, TaskRef};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), batchvisor::RunError> {
///     let tasks: Vec<TaskRef> = (0..5)
///         .map(|i| {
///             TaskFn::arc(format!("task-{i}"), || async { Ok::<_, TaskError>(()) })
///                 as TaskRef
///         })
///         .collect();
///
///     batchvisor::run(tasks, 2, 1).await
/// }
/// ```
pub async fn run(
    tasks: Vec<TaskRef>,
    workers: usize,
    error_budget: usize,
) -> Result<(), RunError> {
    let cfg = RunConfig {
        workers,
        error_budget,
        ..RunConfig::default()
    };
    Runner::new(cfg).run(tasks).await
}

/// Coordinates one batch at a time: admission, the worker pool, event
/// delivery, and graceful shutdown.
pub struct Runner {
    cfg: RunConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Runner {
    /// Creates a runner with the given configuration and no subscribers.
    pub fn new(cfg: RunConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Attaches event subscribers (logging, metrics, custom hooks).
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs the batch to a terminal verdict.
    ///
    /// ### Outcomes
    /// - `Ok(())` — every admitted task finished and failures stayed within
    ///   the budget (always the case for `error_budget == 0`).
    /// - `Err(RunError::InvalidConfig)` — rejected before anything spawned.
    /// - `Err(RunError::BudgetExceeded)` — the pool drained, but more tasks
    ///   failed than the budget tolerates.
    /// - `Err(RunError::GraceExceeded)` — a termination signal arrived and
    ///   in-flight tasks outlived the grace period.
    ///
    /// Individual task errors are absorbed into the failure counter; they
    /// are never surfaced through this result.
    pub async fn run(&self, tasks: Vec<TaskRef>) -> Result<(), RunError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(self.subscribers.clone(), bus.clone()));
        let listener_stop = CancellationToken::new();
        let listener = spawn_listener(bus.subscribe(), Arc::clone(&subs), listener_stop.clone());

        let governor = Arc::new(Governor::new(self.cfg.error_budget));
        let alive = Arc::new(AliveTracker::new());
        let gate = CancellationToken::new();

        let (queue_tx, queue_rx) = mpsc::channel::<Admitted>(1);
        let queue: SharedQueue = Arc::new(Mutex::new(queue_rx));

        let mut set = JoinSet::new();
        set.spawn(dispatch(
            tasks,
            queue_tx,
            Arc::clone(&governor),
            gate.clone(),
            bus.clone(),
        ));
        for _ in 0..self.cfg.workers {
            set.spawn(worker_loop(
                Arc::clone(&queue),
                Arc::clone(&governor),
                Arc::clone(&alive),
                bus.clone(),
            ));
        }
        // The workers must hold the only references to the receiver: once
        // the pool exits, the channel closes and a dispatcher blocked on a
        // full handoff slot sees Err instead of waiting forever.
        drop(queue);

        let joined = self.drive_shutdown(&mut set, &gate, &alive, &bus).await;
        let verdict = match joined {
            Ok(()) => self.verdict(&governor),
            Err(e) => Err(e),
        };

        // Stop observability last, after all verdict events are out, and
        // wait for the fan-out queues to drain before returning.
        listener_stop.cancel();
        let _ = listener.await;
        if let Ok(subs) = Arc::try_unwrap(subs) {
            subs.shutdown().await;
        }

        verdict
    }

    /// Waits until either the whole pool finishes or a shutdown signal
    /// arrives; the signal path closes admission and enforces the grace
    /// window.
    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<()>,
        gate: &CancellationToken,
        alive: &AliveTracker,
        bus: &Bus,
    ) -> Result<(), RunError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                bus.publish(Event::new(EventKind::ShutdownRequested));
                gate.cancel();
                self.wait_all_with_grace(set, alive, bus).await
            }
            _ = async { while set.join_next().await.is_some() {} } => {
                Ok(())
            }
        }
    }

    /// Waits for in-flight tasks to finish within the configured grace
    /// period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and returns
    /// [`RunError::GraceExceeded`] with the names of stuck tasks.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<()>,
        alive: &AliveTracker,
        bus: &Bus,
    ) -> Result<(), RunError> {
        let grace = self.cfg.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(_) => {
                bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = alive.snapshot().await;
                Err(RunError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Final budget decision, taken after the pool has fully stopped.
    fn verdict(&self, governor: &Governor) -> Result<(), RunError> {
        if governor.exceeded() {
            return Err(RunError::BudgetExceeded {
                failures: governor.failures(),
                budget: governor.budget(),
            });
        }
        Ok(())
    }
}

/// Forwards bus events to the subscriber set until stopped, then drains
/// whatever was already published.
fn spawn_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: Arc<SubscriberSet>,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                ev = rx.recv() => match ev {
                    Ok(ev) => subs.emit(Arc::new(ev)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => subs.emit(Arc::new(ev)),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::TaskError;
    use crate::tasks::TaskFn;

    /// Builds a batch where the tasks at `failing` positions fail and every
    /// task bumps `executed` when it runs.
    fn batch(total: usize, failing: &[usize], executed: &Arc<AtomicUsize>) -> Vec<TaskRef> {
        (0..total)
            .map(|i| {
                let executed = Arc::clone(executed);
                let fails = failing.contains(&i);
                TaskFn::arc(format!("task-{i}"), move || {
                    let executed = Arc::clone(&executed);
                    async move {
                        executed.fetch_add(1, Ordering::AcqRel);
                        if fails {
                            Err(TaskError::Fail {
                                error: "planned".into(),
                            })
                        } else {
                            Ok(())
                        }
                    }
                }) as TaskRef
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_successes_complete() {
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(5, &[], &executed);

        run(tasks, 2, 1).await.unwrap();
        assert_eq!(executed.load(Ordering::Acquire), 5);
    }

    #[tokio::test]
    async fn test_failures_over_budget_abort() {
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(10, &[1, 4, 7], &executed);

        let err = run(tasks, 4, 2).await.unwrap_err();
        match err {
            RunError::BudgetExceeded { failures, budget } => {
                assert_eq!(budget, 2);
                assert!(failures > budget);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failures_within_budget_complete() {
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(10, &[1, 4, 7], &executed);

        run(tasks, 4, 5).await.unwrap();
        assert_eq!(executed.load(Ordering::Acquire), 10);
    }

    #[tokio::test]
    async fn test_failures_exactly_at_budget_complete() {
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(10, &[0, 5, 9], &executed);

        run(tasks, 3, 3).await.unwrap();
        assert_eq!(executed.load(Ordering::Acquire), 10);
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        run(Vec::new(), 3, 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_budget_tolerates_everything() {
        let executed = Arc::new(AtomicUsize::new(0));
        let failing: Vec<usize> = (0..10).collect();
        let tasks = batch(10, &failing, &executed);

        run(tasks, 3, 0).await.unwrap();
        assert_eq!(executed.load(Ordering::Acquire), 10);
    }

    #[tokio::test]
    async fn test_zero_workers_rejected_without_executing() {
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(4, &[], &executed);

        let err = run(tasks, 0, 1).await.unwrap_err();
        assert_eq!(err.as_label(), "run_invalid_config");
        assert_eq!(executed.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn test_tripped_budget_stops_admission() {
        // One worker makes execution order deterministic: two failures blow
        // the budget of 1, so none of the later tasks may start.
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(20, &[0, 1], &executed);

        let err = run(tasks, 1, 1).await.unwrap_err();
        assert_eq!(err.as_label(), "run_budget_exceeded");
        assert!(
            executed.load(Ordering::Acquire) <= 3,
            "admission kept feeding after the budget tripped"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_pool_width() {
        let workers = 3;
        let current = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<TaskRef> = (0..24)
            .map(|i| {
                let current = Arc::clone(&current);
                let high_water = Arc::clone(&high_water);
                TaskFn::arc(format!("task-{i}"), move || {
                    let current = Arc::clone(&current);
                    let high_water = Arc::clone(&high_water);
                    async move {
                        let now = current.fetch_add(1, Ordering::AcqRel) + 1;
                        high_water.fetch_max(now, Ordering::AcqRel);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        current.fetch_sub(1, Ordering::AcqRel);
                        Ok(())
                    }
                }) as TaskRef
            })
            .collect();

        run(tasks, workers, 0).await.unwrap();
        assert!(high_water.load(Ordering::Acquire) <= workers);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_returns_only_after_every_started_task_finished() {
        let in_flight = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<TaskRef> = (0..16)
            .map(|i| {
                let in_flight = Arc::clone(&in_flight);
                TaskFn::arc(format!("task-{i}"), move || {
                    let in_flight = Arc::clone(&in_flight);
                    async move {
                        in_flight.fetch_add(1, Ordering::AcqRel);
                        tokio::time::sleep(Duration::from_millis(2)).await;
                        in_flight.fetch_sub(1, Ordering::AcqRel);
                        Ok(())
                    }
                }) as TaskRef
            })
            .collect();

        run(tasks, 4, 0).await.unwrap();
        assert_eq!(in_flight.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn test_panicking_tasks_count_as_failures() {
        use crate::tasks::Task;
        use async_trait::async_trait;

        struct Bomb;

        #[async_trait]
        impl Task for Bomb {
            fn name(&self) -> &str {
                "bomb"
            }

            async fn run(&self) -> Result<(), TaskError> {
                panic!("blown fuse")
            }
        }

        let tasks: Vec<TaskRef> = vec![Arc::new(Bomb), Arc::new(Bomb)];
        let err = run(tasks, 2, 1).await.unwrap_err();
        assert_eq!(err.as_label(), "run_budget_exceeded");
    }

    #[tokio::test]
    async fn test_grace_window_reports_stuck_tasks() {
        let runner = Runner::new(RunConfig {
            grace: Duration::from_millis(20),
            ..RunConfig::default()
        });
        let alive = AliveTracker::new();
        alive.insert(0, "sleeper").await;

        let bus = Bus::new(8);
        let mut set = JoinSet::new();
        set.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let err = runner
            .wait_all_with_grace(&mut set, &alive, &bus)
            .await
            .unwrap_err();
        match err {
            RunError::GraceExceeded { stuck, .. } => assert_eq!(stuck, vec!["sleeper"]),
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_grace_window_lets_fast_tasks_finish() {
        let runner = Runner::new(RunConfig {
            grace: Duration::from_secs(5),
            ..RunConfig::default()
        });
        let alive = AliveTracker::new();

        let bus = Bus::new(8);
        let mut events = bus.subscribe();
        let mut set = JoinSet::new();
        set.spawn(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
        });

        runner
            .wait_all_with_grace(&mut set, &alive, &bus)
            .await
            .unwrap();
        assert_eq!(
            events.recv().await.unwrap().kind,
            EventKind::AllStoppedWithin
        );
    }

    #[tokio::test]
    async fn test_subscribers_observe_the_run() {
        use crate::events::EventKind;
        use async_trait::async_trait;

        struct CountStops(Arc<AtomicUsize>);

        #[async_trait]
        impl Subscribe for CountStops {
            async fn on_event(&self, event: &Event) {
                if event.kind == EventKind::TaskStopped {
                    self.0.fetch_add(1, Ordering::AcqRel);
                }
            }

            fn name(&self) -> &'static str {
                "count-stops"
            }
        }

        let stops = Arc::new(AtomicUsize::new(0));
        let executed = Arc::new(AtomicUsize::new(0));
        let tasks = batch(6, &[], &executed);

        let runner = Runner::new(RunConfig {
            workers: 2,
            ..RunConfig::default()
        })
        .with_subscribers(vec![Arc::new(CountStops(Arc::clone(&stops)))]);

        runner.run(tasks).await.unwrap();
        // the run drains subscriber queues before returning
        assert_eq!(stops.load(Ordering::Acquire), 6);
    }
}
