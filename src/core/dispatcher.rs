//! # Dispatcher: ordered task admission.
//!
//! Consumes the batch left to right and offers each task to the pool through
//! a single bounded handoff channel. Before every offer it consults the
//! [`Governor`]; once the budget trips, admission stops for good.
//!
//! ## Architecture
//! ```text
//! Vec<TaskRef> ──► dispatch() ──► mpsc::channel(1) ──► competing workers
//!                     │
//!                     ├─ Governor::exceeded()?  → stop, publish BudgetTripped
//!                     └─ gate cancelled?        → stop (shutdown signal)
//!
//! On exit: publish AdmissionClosed, drop the sender.
//! Dropping the sender closes the channel for every blocked worker at once.
//! ```
//!
//! ## Rules
//! - Admission order is the batch order; each task is handed to exactly one
//!   worker.
//! - The channel capacity is 1: the dispatcher hands off one task at a time
//!   and never races ahead of the pool (backpressure is intentional).
//! - The dispatcher cannot fail on its own; it only reacts to the governor
//!   and the shutdown gate.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::governor::Governor;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::TaskRef;

/// One admitted task, tagged with its position in the batch.
pub(crate) struct Admitted {
    pub index: usize,
    pub task: TaskRef,
}

/// Feeds the batch into the handoff channel until it is exhausted, the
/// budget trips, or the shutdown gate closes.
pub(crate) async fn dispatch(
    tasks: Vec<TaskRef>,
    queue: mpsc::Sender<Admitted>,
    governor: Arc<Governor>,
    gate: CancellationToken,
    bus: Bus,
) {
    for (index, task) in tasks.into_iter().enumerate() {
        if governor.exceeded() {
            bus.publish(Event::new(EventKind::BudgetTripped).with_failures(governor.failures()));
            break;
        }
        tokio::select! {
            res = queue.send(Admitted { index, task }) => {
                // Err means every worker is gone already; nothing left to feed.
                if res.is_err() {
                    break;
                }
            }
            _ = gate.cancelled() => {
                break;
            }
        }
    }

    bus.publish(Event::new(EventKind::AdmissionClosed));
    // `queue` drops here: every blocked worker observes the close at once.
}
