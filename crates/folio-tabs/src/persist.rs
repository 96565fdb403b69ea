//! Persisted tab strip state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::TabKind;
use crate::tab::TabData;

/// One entry of the saved tab strip.
///
/// `kind` is never `ReaderUnloaded` when produced by the registry; unloaded
/// tabs are saved as readers and come back unloaded unless selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTab {
    #[serde(rename = "type")]
    pub kind: TabKind,
    #[serde(default)]
    pub title: String,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_unselected: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TabData>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}
