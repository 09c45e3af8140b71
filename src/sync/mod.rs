pub mod controller;
mod scanner;
pub mod state;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use controller::TaskSynchronizer;
pub use state::TaskList;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Quiet period after the last edit before the list is pushed.
    pub debounce_ms: u64,
    pub scan_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 1_000,
            scan_interval_secs: 15,
        }
    }
}

impl SyncSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn scan_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_secs(self.scan_interval_secs.max(1))
    }
}
