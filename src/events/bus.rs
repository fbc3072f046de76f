//! # Event bus for broadcasting run events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (workers, dispatcher,
//! runner).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                 Subscriber (one):
//!   Worker 1 ──┐
//!   Worker 2 ──┼──────► Bus ───────► runner listener ────► SubscriberSet
//!   Worker N ──┤  (broadcast chan)
//!   Dispatcher ┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: a single ring buffer stores recent events.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip
//!   the `n` oldest items.
//! - **No persistence**: events are dropped if nobody is subscribed at send
//!   time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for run events.
///
/// Multiple publishers can publish concurrently; subscribers receive clones
/// of each event. Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// The minimum capacity is 1 (clamped). Capacity is shared across all
    /// receivers; a receiver that falls behind observes `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// Each call creates an independent receiver; it only gets events sent
    /// after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::TaskStarting).with_task("t"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::TaskStarting);
        assert_eq!(ev.task.as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = Bus::new(1);
        // no receiver; must not block or panic
        bus.publish(Event::new(EventKind::AdmissionClosed));
    }
}
