//! # Run configuration.
//!
//! [`RunConfig`] defines the shape of one batch run: pool width, failure
//! budget, event bus capacity, and the shutdown grace period.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use batchvisor::RunConfig;
//!
//! let mut cfg = RunConfig::default();
//! cfg.workers = 4;
//! cfg.error_budget = 2;
//! cfg.grace = Duration::from_secs(10);
//!
//! assert!(cfg.validate().is_ok());
//! ```

use std::time::Duration;

use crate::error::RunError;

/// Configuration for one batch run.
///
/// Immutable for the duration of a run; nothing here is shared across runs.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Number of pool workers. Must be at least 1; `0` is rejected by
    /// [`RunConfig::validate`] — a zero-width pool with a non-empty batch
    /// could never make progress.
    pub workers: usize,
    /// Maximum number of task failures tolerated (0 = unlimited).
    ///
    /// With a non-zero budget the run fails once failures exceed it, and
    /// admission of new tasks stops at the same moment.
    pub error_budget: usize,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
    /// Maximum time to wait for in-flight tasks after a shutdown signal.
    pub grace: Duration,
}

impl Default for RunConfig {
    /// Provides a default configuration:
    /// - `workers = 1`
    /// - `error_budget = 0` (unlimited)
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            workers: 1,
            error_budget: 0,
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}

impl RunConfig {
    /// Checks the configuration before a run starts.
    ///
    /// Returns [`RunError::InvalidConfig`] when `workers == 0`. Called by the
    /// runner before anything is spawned, so a rejected configuration never
    /// executes a single task.
    pub fn validate(&self) -> Result<(), RunError> {
        if self.workers == 0 {
            return Err(RunError::InvalidConfig {
                reason: "workers must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
