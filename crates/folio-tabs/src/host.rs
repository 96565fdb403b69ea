//! Collaborators the registry talks to
//!
//! The registry owns tab state only. Painting, viewers, item lookup and
//! event fan-out belong to the host application and are injected here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::kind::TabKind;
use crate::tab::ItemId;

/// What the render sink paints for one tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TabKind,
    pub title: String,
    pub selected: bool,
    pub icon: Option<String>,
}

/// Ordered tab strip contents pushed after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub tabs: Vec<TabSnapshot>,
}

impl RenderFrame {
    pub fn selected(&self) -> Option<&TabSnapshot> {
        self.tabs.iter().find(|t| t.selected)
    }
}

/// UI adapter for the tab strip
pub trait RenderSink: Send + Sync {
    fn render(&self, frame: &RenderFrame);

    fn set_window_title(&self, title: &str);

    fn dismiss_tooltips(&self);

    /// Release the view resources behind a closed or unloaded tab.
    /// Called after the render that removed it; the id may already be gone.
    fn release_view(&self, tab_id: &str);

    /// Id of the tab node holding keyboard focus, if any
    fn focused_tab_id(&self) -> Option<String>;

    /// Focus the first visible node for `tab_id`; false if none took focus
    fn focus_tab(&self, tab_id: &str) -> bool;

    /// Move keyboard focus into the content behind a tab
    fn focus_content(&self, tab_id: &str);
}

/// Options passed to [`DocumentOpener::open`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
    pub title: Option<String>,
    pub tab_index: Option<usize>,
    pub open_in_background: bool,
    pub second_view_state: Option<Value>,
    /// Reuse this id for the tab the opener adds
    #[serde(rename = "tabID")]
    pub tab_id: Option<String>,
    pub allow_duplicate: bool,
    pub prevent_jumpback: bool,
    pub open_in_window: bool,
}

/// Live viewer behind a reader tab
pub trait ViewerHandle: Send + Sync {
    fn focus(&self);
}

/// Opens document viewers for items.
///
/// `open` is fire-and-forget: the opener loads the viewer and later adds the
/// tab through the registry, honoring `tab_id`, `tab_index` and
/// `open_in_background`.
pub trait DocumentOpener: Send + Sync {
    fn open(&self, item_id: ItemId, location: Option<Value>, options: OpenOptions);

    fn get_by_tab_id(&self, tab_id: &str) -> Option<Arc<dyn ViewerHandle>>;
}

/// Host item model lookup
pub trait ItemCatalog: Send + Sync {
    fn item_exists(&self, item_id: ItemId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabAction {
    Add,
    Close,
    Select,
}

impl TabAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabAction::Add => "add",
            TabAction::Close => "close",
            TabAction::Select => "select",
        }
    }
}

/// Lifecycle event broadcast to other parts of the application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabEvent {
    pub action: TabAction,
    /// Always `"tab"`
    pub subject: &'static str,
    pub ids: Vec<String>,
    pub payload: Map<String, Value>,
}

impl TabEvent {
    pub const SUBJECT: &'static str = "tab";

    pub fn new(action: TabAction, ids: Vec<String>, payload: Map<String, Value>) -> Self {
        Self {
            action,
            subject: Self::SUBJECT,
            ids,
            payload,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: TabEvent);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything the registry needs from the outside world
#[derive(Clone)]
pub struct TabHost {
    pub ui: Arc<dyn RenderSink>,
    pub opener: Arc<dyn DocumentOpener>,
    pub catalog: Arc<dyn ItemCatalog>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl TabHost {
    pub fn new(
        ui: Arc<dyn RenderSink>,
        opener: Arc<dyn DocumentOpener>,
        catalog: Arc<dyn ItemCatalog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ui,
            opener,
            catalog,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
