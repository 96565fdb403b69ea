//! Recording collaborators for registry tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::TabsConfig;
use crate::host::{
    Clock, DocumentOpener, ItemCatalog, Notifier, OpenOptions, RenderFrame, RenderSink,
    TabAction, TabEvent, TabHost, ViewerHandle,
};
use crate::registry::TabRegistry;
use crate::tab::ItemId;

#[derive(Default)]
pub struct RecordingUi {
    pub frames: Mutex<Vec<RenderFrame>>,
    pub titles: Mutex<Vec<String>>,
    pub released: Mutex<Vec<String>>,
    pub focused: Mutex<Option<String>>,
    pub focused_tabs: Mutex<Vec<String>>,
    pub focused_content: Mutex<Vec<String>>,
    pub tooltip_dismissals: Mutex<usize>,
}

impl RecordingUi {
    pub fn last_frame(&self) -> RenderFrame {
        self.frames.lock().last().cloned().expect("no frame rendered")
    }

    pub fn last_title(&self) -> String {
        self.titles.lock().last().cloned().unwrap_or_default()
    }
}

impl RenderSink for RecordingUi {
    fn render(&self, frame: &RenderFrame) {
        self.frames.lock().push(frame.clone());
    }

    fn set_window_title(&self, title: &str) {
        self.titles.lock().push(title.to_string());
    }

    fn dismiss_tooltips(&self) {
        *self.tooltip_dismissals.lock() += 1;
    }

    fn release_view(&self, tab_id: &str) {
        self.released.lock().push(tab_id.to_string());
    }

    fn focused_tab_id(&self) -> Option<String> {
        self.focused.lock().clone()
    }

    fn focus_tab(&self, tab_id: &str) -> bool {
        self.focused_tabs.lock().push(tab_id.to_string());
        *self.focused.lock() = Some(tab_id.to_string());
        true
    }

    fn focus_content(&self, tab_id: &str) {
        self.focused_content.lock().push(tab_id.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenCall {
    pub item_id: ItemId,
    pub location: Option<Value>,
    pub options: OpenOptions,
}

#[derive(Default)]
pub struct RecordingViewer {
    pub focus_calls: Mutex<usize>,
}

impl ViewerHandle for RecordingViewer {
    fn focus(&self) {
        *self.focus_calls.lock() += 1;
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub calls: Mutex<Vec<OpenCall>>,
    pub viewer: Arc<RecordingViewer>,
    pub viewer_tabs: Mutex<HashSet<String>>,
}

impl RecordingOpener {
    pub fn take_calls(&self) -> Vec<OpenCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl DocumentOpener for RecordingOpener {
    fn open(&self, item_id: ItemId, location: Option<Value>, options: OpenOptions) {
        self.calls.lock().push(OpenCall {
            item_id,
            location,
            options,
        });
    }

    fn get_by_tab_id(&self, tab_id: &str) -> Option<Arc<dyn ViewerHandle>> {
        if self.viewer_tabs.lock().contains(tab_id) {
            let viewer: Arc<dyn ViewerHandle> = self.viewer.clone();
            Some(viewer)
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    pub deleted: Mutex<HashSet<ItemId>>,
}

impl ItemCatalog for FakeCatalog {
    fn item_exists(&self, item_id: ItemId) -> bool {
        !self.deleted.lock().contains(&item_id)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<TabEvent>>,
}

impl RecordingNotifier {
    pub fn actions(&self) -> Vec<TabAction> {
        self.events.lock().iter().map(|e| e.action).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: TabEvent) {
        self.events.lock().push(event);
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
        }
    }

    pub fn advance(&self, secs: i64) {
        *self.now.lock() += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

pub struct Fixture {
    pub ui: Arc<RecordingUi>,
    pub opener: Arc<RecordingOpener>,
    pub catalog: Arc<FakeCatalog>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            ui: Arc::new(RecordingUi::default()),
            opener: Arc::new(RecordingOpener::default()),
            catalog: Arc::new(FakeCatalog::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            clock: Arc::new(ManualClock::new()),
        }
    }

    pub fn host(&self) -> TabHost {
        TabHost::new(
            self.ui.clone(),
            self.opener.clone(),
            self.catalog.clone(),
            self.notifier.clone(),
        )
        .with_clock(self.clock.clone())
    }

    pub fn registry(&self) -> TabRegistry {
        self.registry_with(TabsConfig::default())
    }

    pub fn registry_with(&self, config: TabsConfig) -> TabRegistry {
        TabRegistry::new(config, self.host())
    }
}
