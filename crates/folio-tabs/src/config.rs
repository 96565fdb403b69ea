//! Tab strip configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Loaded tab limit for machines with at most this much memory
const LOW_MEMORY_BYTES: u64 = 8 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabsConfig {
    /// Appended to the selected tab title for the window title
    pub app_name: String,
    /// How many unselected reader tabs may stay loaded
    pub max_loaded_tabs: usize,
    /// Reader tabs unselected for longer than this are unloaded
    pub unload_after: Duration,
    /// Period of the background eviction sweep
    pub eviction_interval: Duration,
    /// Number of closed-tab batches kept for undo
    pub history_limit: usize,
}

impl TabsConfig {
    pub fn with_max_loaded_tabs(mut self, max_loaded_tabs: usize) -> Self {
        self.max_loaded_tabs = max_loaded_tabs;
        self
    }
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            app_name: "Folio".to_string(),
            max_loaded_tabs: 3,
            unload_after: Duration::from_secs(24 * 60 * 60),
            eviction_interval: Duration::from_secs(60),
            history_limit: 20,
        }
    }
}

/// Loaded tab limit for a machine with `total_memory` bytes of RAM
pub fn max_loaded_tabs_for_memory(total_memory: u64) -> usize {
    if total_memory <= LOW_MEMORY_BYTES {
        3
    } else {
        5
    }
}
