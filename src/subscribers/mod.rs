//! # Event subscribers for the batch runner.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! for handling run events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   workers/dispatcher ── publish(Event) ──► Bus ──► runner listener
//!                                                        │
//!                                                  SubscriberSet
//!                                              ┌─────────┼─────────┐
//!                                              ▼         ▼         ▼
//!                                          LogWriter  Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use batchvisor::{Event, EventKind, Subscribe};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskFailed {
//!             // increment a metric...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

mod set;
mod subscribe;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
