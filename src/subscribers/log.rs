//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [starting] task=import index=3
//! [stopped] task=import index=3
//! [failed] task=import index=3 err="connection refused"
//! [budget-tripped] failures=3
//! [admission-closed]
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use —
/// implement a custom [`Subscribe`] for structured logging or metrics
/// collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskStarting => {
                if let (Some(task), Some(index)) = (&e.task, e.index) {
                    println!("[starting] task={task} index={index}");
                }
            }
            EventKind::TaskStopped => {
                if let (Some(task), Some(index)) = (&e.task, e.index) {
                    println!("[stopped] task={task} index={index}");
                }
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={:?} index={:?} err={:?}",
                    e.task, e.index, e.reason
                );
            }
            EventKind::BudgetTripped => {
                println!("[budget-tripped] failures={:?}", e.failures);
            }
            EventKind::AdmissionClosed => {
                println!("[admission-closed]");
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                println!("[subscriber-trouble] who={:?} why={:?}", e.task, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
