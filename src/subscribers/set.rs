//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] distributes events to all subscribers concurrently
//! without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately.
//! - **Per-subscriber FIFO**: each subscriber sees events in order; there is
//!   no ordering across subscribers.
//! - **Overflow**: a full queue drops the event for that subscriber only and
//!   publishes `SubscriberOverflow` (never re-published for overflow events
//!   themselves, so overflow cannot feed on itself).
//! - **Isolation**: a panicking subscriber is caught, reported as
//!   `SubscriberPanicked`, and its worker keeps going.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::core::worker::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Per-subscriber queue handle.
struct SubscriberChannel {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event subscribers.
///
/// Spawns one worker task per subscriber at construction; the workers run
/// until [`SubscriberSet::shutdown`] closes their queues.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Each subscriber gets a bounded queue sized by
    /// [`Subscribe::queue_capacity`] (minimum 1).
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subscribers.len());
        let mut workers = Vec::with_capacity(subscribers.len());

        for sub in subscribers {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        bus_for_worker.publish(Event::subscriber_panicked(
                            sub.name(),
                            panic_message(payload.as_ref()),
                        ));
                    }
                }
            });

            channels.push(SubscriberChannel { name, queue: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Offers an event to every subscriber queue without blocking.
    ///
    /// On a full or closed queue the event is dropped for that subscriber
    /// and a `SubscriberOverflow` is published instead.
    pub fn emit(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            match channel.queue.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// Drops the queues (workers finish whatever is already enqueued, then
    /// exit) and joins every worker.
    pub async fn shutdown(self) {
        drop(self.channels);

        for handle in self.workers {
            let _ = handle.await;
        }
    }
}
