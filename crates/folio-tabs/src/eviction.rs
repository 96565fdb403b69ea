//! Reader tab unload policy
//!
//! Viewers are expensive, so reader tabs that sit unselected are released
//! and replaced by unloaded placeholders. Two rules apply, in order:
//! 1. a reader unselected for longer than `unload_after` is unloaded;
//! 2. of the readers left, only the `max_loaded_tabs` most recently
//!    unselected stay loaded.
//!
//! The selected tab is never a candidate.

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::time::Duration;

use crate::config::TabsConfig;
use crate::kind::TabKind;
use crate::tab::Tab;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    pub max_loaded_tabs: usize,
    pub unload_after: Duration,
}

impl EvictionPolicy {
    pub fn new(max_loaded_tabs: usize, unload_after: Duration) -> Self {
        Self {
            max_loaded_tabs,
            unload_after,
        }
    }

    pub fn from_config(config: &TabsConfig) -> Self {
        Self::new(config.max_loaded_tabs, config.unload_after)
    }

    /// Ids of the tabs to unload, idle ones first
    pub fn plan(&self, tabs: &[Tab], selected_id: &str, now: DateTime<Utc>) -> Vec<String> {
        let (idle, mut loaded): (Vec<&Tab>, Vec<&Tab>) = tabs
            .iter()
            .filter(|t| t.kind == TabKind::Reader && t.id != selected_id)
            .partition(|t| self.is_idle(t, now));

        // A reader that was never unselected counts as the most recent
        loaded.sort_by_key(|t| Reverse(t.time_unselected.unwrap_or(DateTime::<Utc>::MAX_UTC)));

        idle.into_iter()
            .chain(loaded.into_iter().skip(self.max_loaded_tabs))
            .map(|t| t.id.clone())
            .collect()
    }

    fn is_idle(&self, tab: &Tab, now: DateTime<Utc>) -> bool {
        let Some(unselected) = tab.time_unselected else {
            return false;
        };
        match (now - unselected).to_std() {
            Ok(elapsed) => elapsed > self.unload_after,
            Err(_) => false,
        }
    }
}
