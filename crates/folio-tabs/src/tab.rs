//! Tab data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TabError;
use crate::host::OpenOptions;
use crate::kind::TabKind;
use crate::Result;

/// Identifier of a library item in the host application
pub type ItemId = i64;

/// Id of the permanent library tab
pub const LIBRARY_TAB_ID: &str = "zotero-pane";

/// Callback run once when a tab is closed or its viewer released
pub type OnClose = Box<dyn FnOnce() + Send>;

/// Host payload attached to document tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabData {
    #[serde(rename = "itemID")]
    pub item_id: ItemId,
    /// Split-view state of the viewer, restored on reload
    #[serde(
        rename = "secondViewState",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub second_view_state: Option<Value>,
    /// Anything else the host stores; passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TabData {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            item_id,
            second_view_state: None,
            extra: Map::new(),
        }
    }

    pub fn with_second_view_state(mut self, state: Value) -> Self {
        self.second_view_state = Some(state);
        self
    }
}

pub struct Tab {
    /// Unique identifier
    pub id: String,
    pub kind: TabKind,
    pub title: String,
    pub data: Option<TabData>,
    /// Last time the tab became selected
    pub time_selected: Option<DateTime<Utc>>,
    /// Last time the tab stopped being selected
    pub time_unselected: Option<DateTime<Utc>>,
    /// Cached icon reference for the render sink
    pub icon: Option<String>,
    pub(crate) on_close: Option<OnClose>,
}

impl Tab {
    pub(crate) fn new(id: String, kind: TabKind, title: String, data: Option<TabData>) -> Self {
        Self {
            id,
            kind,
            title,
            data,
            time_selected: None,
            time_unselected: None,
            icon: None,
            on_close: None,
        }
    }

    pub(crate) fn library() -> Self {
        Self::new(
            LIBRARY_TAB_ID.to_string(),
            TabKind::Library,
            String::new(),
            None,
        )
    }

    pub fn is_library(&self) -> bool {
        self.id == LIBRARY_TAB_ID
    }

    pub fn item_id(&self) -> Option<ItemId> {
        self.data.as_ref().map(|d| d.item_id)
    }

    pub fn has_close_callback(&self) -> bool {
        self.on_close.is_some()
    }

    /// Attempt to change kind along the document state machine
    pub(crate) fn transition_to(&mut self, kind: TabKind) -> Result<()> {
        if !self.kind.can_transition_to(kind) {
            return Err(TabError::InvalidTransition {
                from: self.kind.to_string(),
                to: kind.to_string(),
            });
        }

        tracing::debug!(
            tab_id = %self.id,
            from = %self.kind,
            to = %kind,
            "Tab kind transition"
        );

        self.kind = kind;
        Ok(())
    }

    /// Run and drop the close callback, if any
    pub(crate) fn run_close_callback(&mut self) {
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("data", &self.data)
            .field("time_selected", &self.time_selected)
            .field("time_unselected", &self.time_unselected)
            .field("icon", &self.icon)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

/// Arguments to [`TabRegistry::add`](crate::TabRegistry::add)
pub struct AddTab {
    pub id: Option<String>,
    pub kind: TabKind,
    pub title: String,
    pub data: Option<TabData>,
    /// Insert position; must be 1 or greater, defaults to the end
    pub index: Option<usize>,
    pub select: bool,
    /// Don't remember the current selection as the jumpback target
    pub prevent_jumpback: bool,
    pub on_close: Option<OnClose>,
}

impl AddTab {
    pub fn new(kind: TabKind, title: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            title: title.into(),
            data: None,
            index: None,
            select: false,
            prevent_jumpback: false,
            on_close: None,
        }
    }

    /// A loaded document tab for `item_id`
    pub fn reader(item_id: ItemId, title: impl Into<String>) -> Self {
        Self::new(TabKind::Reader, title).data(TabData::new(item_id))
    }

    /// The tab a document opener adds once it has loaded `item_id`
    pub fn from_open(item_id: ItemId, options: &OpenOptions) -> Self {
        let mut data = TabData::new(item_id);
        data.second_view_state = options.second_view_state.clone();

        let mut add = Self::new(TabKind::Reader, options.title.clone().unwrap_or_default())
            .data(data)
            .select(!options.open_in_background)
            .prevent_jumpback(options.prevent_jumpback);
        add.id = options.tab_id.clone();
        add.index = options.tab_index;
        add
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn data(mut self, data: TabData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn select(mut self, select: bool) -> Self {
        self.select = select;
        self
    }

    pub fn prevent_jumpback(mut self, prevent: bool) -> Self {
        self.prevent_jumpback = prevent;
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_tab() {
        let tab = Tab::library();
        assert!(tab.is_library());
        assert_eq!(tab.kind, TabKind::Library);
        assert!(tab.title.is_empty());
        assert_eq!(tab.item_id(), None);
    }

    #[test]
    fn test_transitions() {
        let mut tab = Tab::new(
            "t1".to_string(),
            TabKind::Reader,
            "Paper".to_string(),
            Some(TabData::new(7)),
        );

        tab.transition_to(TabKind::ReaderUnloaded).unwrap();
        assert_eq!(tab.kind, TabKind::ReaderUnloaded);
        tab.transition_to(TabKind::Reader).unwrap();
        assert_eq!(tab.kind, TabKind::Reader);

        let err = tab.transition_to(TabKind::Library).unwrap_err();
        assert!(matches!(err, TabError::InvalidTransition { .. }));
    }

    #[test]
    fn test_close_callback_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut tab = Tab::new("t1".to_string(), TabKind::Reader, "Paper".to_string(), None);
        tab.on_close = Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        tab.run_close_callback();
        tab.run_close_callback();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!tab.has_close_callback());
    }

    #[test]
    fn test_add_from_open_options() {
        let options = OpenOptions {
            title: Some("Paper".to_string()),
            tab_index: Some(2),
            second_view_state: Some(json!({"page": 4})),
            tab_id: Some("t9".to_string()),
            prevent_jumpback: true,
            ..OpenOptions::default()
        };

        let add = AddTab::from_open(5, &options);
        assert_eq!(add.id.as_deref(), Some("t9"));
        assert_eq!(add.kind, TabKind::Reader);
        assert_eq!(add.index, Some(2));
        assert!(add.select);
        assert!(add.prevent_jumpback);
        let data = add.data.unwrap();
        assert_eq!(data.item_id, 5);
        assert_eq!(data.second_view_state, Some(json!({"page": 4})));
    }

    #[test]
    fn test_tab_data_wire_format() {
        let raw = json!({
            "itemID": 42,
            "secondViewState": {"scroll": 3},
            "pinned": true
        });
        let data: TabData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(data.item_id, 42);
        assert_eq!(data.second_view_state, Some(json!({"scroll": 3})));
        assert_eq!(data.extra.get("pinned"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&data).unwrap(), raw);
    }
}
