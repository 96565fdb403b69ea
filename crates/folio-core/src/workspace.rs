//! Main workspace state container
//!
//! Owns the tab registry and its persistence. Mutations made through
//! [`Workspace::with_tabs`] are saved immediately so a crash restores the
//! strip as it was last seen.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use folio_storage::{Database, StorageError};
use folio_tabs::{SavedTab, TabHost, TabRegistry};

use crate::config::Config;
use crate::Result;

/// Settings key holding the serialized tab strip
pub const TAB_STATE_KEY: &str = "tabs.state";

pub struct Workspace {
    config: Config,
    db: Database,
    tabs: Arc<Mutex<TabRegistry>>,
}

impl Workspace {
    /// Open the database at the configured path and build an empty tab strip
    pub fn new(config: Config, host: TabHost) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Ok(Self::with_database(config, db, host))
    }

    pub fn with_database(config: Config, db: Database, host: TabHost) -> Self {
        let registry = TabRegistry::new(config.tabs.clone(), host);

        Self {
            config,
            db,
            tabs: Arc::new(Mutex::new(registry)),
        }
    }

    /// Restore the tab strip saved by a previous run
    pub fn initialize(&self) -> Result<()> {
        let saved = match self.db.get_json::<Vec<SavedTab>>(TAB_STATE_KEY) {
            Ok(saved) => saved,
            Err(StorageError::Serialization(e)) => {
                tracing::warn!(error = %e, "Discarding unreadable saved tab state");
                self.db.delete_setting(TAB_STATE_KEY)?;
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(saved) = saved {
            self.tabs.lock().restore_state(&saved);
        }

        tracing::info!("Workspace initialized");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle for callers that drive the registry themselves
    pub fn registry(&self) -> Arc<Mutex<TabRegistry>> {
        Arc::clone(&self.tabs)
    }

    /// Run a mutation against the registry, then save the resulting state
    pub fn with_tabs<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TabRegistry) -> T,
    {
        let (value, state) = {
            let mut tabs = self.tabs.lock();
            let value = f(&mut tabs);
            (value, tabs.get_state())
        };

        self.db.set_json(TAB_STATE_KEY, &state)?;
        Ok(value)
    }

    pub fn read_tabs<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&TabRegistry) -> T,
    {
        f(&self.tabs.lock())
    }

    pub fn save_state(&self) -> Result<()> {
        let state = self.tabs.lock().get_state();
        self.db.set_json(TAB_STATE_KEY, &state)?;
        Ok(())
    }

    /// Sweep idle reader tabs on the configured interval.
    ///
    /// Unloading never changes the saved state, so nothing is persisted here.
    pub fn spawn_eviction_ticker(&self) -> JoinHandle<()> {
        let tabs = Arc::clone(&self.tabs);
        let period = self.config.tabs.eviction_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                tracing::trace!("Eviction tick");
                tabs.lock().sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use folio_tabs::{
        AddTab, Clock, DocumentOpener, ItemCatalog, ItemId, Notifier, OpenOptions, RenderFrame,
        RenderSink, SelectOptions, TabEvent, TabKind, ViewerHandle, LIBRARY_TAB_ID,
    };
    use serde_json::Value;
    use std::path::PathBuf;

    struct NullUi;

    impl RenderSink for NullUi {
        fn render(&self, _frame: &RenderFrame) {}
        fn set_window_title(&self, _title: &str) {}
        fn dismiss_tooltips(&self) {}
        fn release_view(&self, _tab_id: &str) {}
        fn focused_tab_id(&self) -> Option<String> {
            None
        }
        fn focus_tab(&self, _tab_id: &str) -> bool {
            false
        }
        fn focus_content(&self, _tab_id: &str) {}
    }

    #[derive(Default)]
    struct Opener {
        opened: Mutex<Vec<(ItemId, OpenOptions)>>,
    }

    impl DocumentOpener for Opener {
        fn open(&self, item_id: ItemId, _location: Option<Value>, options: OpenOptions) {
            self.opened.lock().push((item_id, options));
        }

        fn get_by_tab_id(&self, _tab_id: &str) -> Option<Arc<dyn ViewerHandle>> {
            None
        }
    }

    struct AllItems;

    impl ItemCatalog for AllItems {
        fn item_exists(&self, _item_id: ItemId) -> bool {
            true
        }
    }

    struct Quiet;

    impl Notifier for Quiet {
        fn notify(&self, _event: TabEvent) {}
    }

    struct TestClock(Mutex<DateTime<Utc>>);

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }

    fn host(opener: Arc<Opener>, clock: Arc<TestClock>) -> TabHost {
        TabHost::new(Arc::new(NullUi), opener, Arc::new(AllItems), Arc::new(Quiet))
            .with_clock(clock)
    }

    fn clock() -> Arc<TestClock> {
        Arc::new(TestClock(Mutex::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )))
    }

    fn workspace(db: Database, opener: Arc<Opener>, clock: Arc<TestClock>) -> Workspace {
        let mut config = Config::new(PathBuf::from("/tmp/folio-test"));
        config.tabs.max_loaded_tabs = 3;
        Workspace::with_database(config, db, host(opener, clock))
    }

    #[test]
    fn test_mutations_are_saved_and_restored() {
        let db = Database::open_in_memory().unwrap();
        let ws = workspace(db.clone(), Arc::new(Opener::default()), clock());
        ws.initialize().unwrap();

        ws.with_tabs(|tabs| {
            tabs.rename(LIBRARY_TAB_ID, "My Library");
            tabs.add(AddTab::reader(1, "First")).unwrap();
            tabs.add(AddTab::reader(2, "Second")).unwrap();
        })
        .unwrap();

        let saved: Vec<SavedTab> = db.get_json(TAB_STATE_KEY).unwrap().unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0].title, "My Library");

        // A second run over the same database gets the same strip back
        let restored = workspace(db, Arc::new(Opener::default()), clock());
        restored.initialize().unwrap();
        let titles = restored.read_tabs(|tabs| {
            tabs.tabs()
                .iter()
                .map(|t| t.title.clone())
                .collect::<Vec<_>>()
        });
        assert_eq!(titles, vec!["My Library", "First", "Second"]);
        assert!(restored.read_tabs(|tabs| tabs
            .tabs()
            .iter()
            .skip(1)
            .all(|t| t.kind == TabKind::ReaderUnloaded)));
    }

    #[test]
    fn test_selected_tab_reopened_on_restore() {
        let db = Database::open_in_memory().unwrap();
        let ws = workspace(db.clone(), Arc::new(Opener::default()), clock());
        ws.with_tabs(|tabs| {
            tabs.add(AddTab::reader(7, "Open").select(true)).unwrap();
        })
        .unwrap();

        let opener = Arc::new(Opener::default());
        let restored = workspace(db, Arc::clone(&opener), clock());
        restored.initialize().unwrap();

        let opened = opener.opened.lock();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].0, 7);
        assert_eq!(opened[0].1.tab_index, Some(1));
        assert!(!opened[0].1.open_in_background);
    }

    #[test]
    fn test_corrupt_state_is_discarded() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(TAB_STATE_KEY, "{oops").unwrap();

        let ws = workspace(db, Arc::new(Opener::default()), clock());
        ws.initialize().unwrap();
        assert_eq!(ws.read_tabs(|tabs| tabs.tabs().len()), 1);
        assert_eq!(ws.db.get_setting(TAB_STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_validation_errors_do_not_block_saving() {
        let db = Database::open_in_memory().unwrap();
        let ws = workspace(db, Arc::new(Opener::default()), clock());

        let result = ws
            .with_tabs(|tabs| tabs.add(AddTab::reader(1, "")))
            .unwrap();
        assert!(result.is_err());
        ws.save_state().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_ticker_unloads_idle_tabs() {
        let db = Database::open_in_memory().unwrap();
        let clock = clock();
        let ws = workspace(db, Arc::new(Opener::default()), Arc::clone(&clock));

        let id = ws
            .with_tabs(|tabs| {
                let id = tabs.add(AddTab::reader(1, "Idle")).unwrap();
                tabs.select(&id, false, SelectOptions::default());
                tabs.select(LIBRARY_TAB_ID, false, SelectOptions::default());
                id
            })
            .unwrap();

        let ticker = ws.spawn_eviction_ticker();
        *clock.0.lock() += Duration::hours(25);

        let period = ws.config().tabs.eviction_interval;
        tokio::time::sleep(period + std::time::Duration::from_secs(1)).await;

        let kind = ws.read_tabs(|tabs| tabs.tab(&id).map(|t| t.kind));
        assert_eq!(kind, Some(TabKind::ReaderUnloaded));
        ticker.abort();
    }
}
