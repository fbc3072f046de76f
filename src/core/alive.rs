//! # In-flight task tracker.
//!
//! Maintains the set of tasks currently executing on the pool, keyed by
//! batch index so duplicate task names cannot corrupt the set. Workers
//! update it around each execution; the runner snapshots it when the
//! shutdown grace period runs out to report which tasks are stuck.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Tracks which tasks are currently in flight.
///
/// Scoped to a single run, like everything else in the core.
pub(crate) struct AliveTracker {
    state: Mutex<HashMap<usize, Arc<str>>>,
}

impl AliveTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Marks the task at `index` as executing.
    pub async fn insert(&self, index: usize, name: &str) {
        self.state.lock().await.insert(index, Arc::from(name));
    }

    /// Marks the task at `index` as finished.
    pub async fn remove(&self, index: usize) {
        self.state.lock().await.remove(&index);
    }

    /// Returns the sorted names of tasks still executing.
    ///
    /// Used for stuck-task reporting when the grace period is exceeded.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.values().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }
}
