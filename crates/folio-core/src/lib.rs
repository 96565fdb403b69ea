//! Folio Core
//!
//! Wires the tab strip to persistent storage and a background eviction
//! ticker. The host UI supplies the collaborators; everything else is owned
//! here.

mod config;
mod error;
mod workspace;

pub use config::Config;
pub use error::CoreError;
pub use workspace::{Workspace, TAB_STATE_KEY};

// Re-export core components
pub use folio_storage::{Database, StorageError};
pub use folio_tabs::{
    AddTab, Clock, DocumentOpener, FocusDirection, ItemCatalog, ItemId, Notifier, OpenOptions,
    RenderFrame, RenderSink, SavedTab, SelectOptions, SystemClock, TabAction, TabData, TabError,
    TabEvent, TabHost, TabKind, TabRegistry, TabsConfig, ViewerHandle, LIBRARY_TAB_ID,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
