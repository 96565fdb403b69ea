//! Folio Tab Strip
//!
//! The tab strip holds one permanent library tab followed by reader tabs for
//! opened documents. Reader tabs that go unused are unloaded to save memory
//! and transparently reloaded when selected again.

mod config;
mod error;
mod eviction;
mod focus;
mod history;
mod host;
mod kind;
mod persist;
mod registry;
mod tab;

#[cfg(test)]
mod testing;

pub use config::{max_loaded_tabs_for_memory, TabsConfig};
pub use error::TabError;
pub use eviction::EvictionPolicy;
pub use focus::{resolve as resolve_focus, FocusDirection};
pub use history::{ClosedTab, HistoryStack};
pub use host::{
    Clock, DocumentOpener, ItemCatalog, Notifier, OpenOptions, RenderFrame, RenderSink,
    SystemClock, TabAction, TabEvent, TabHost, TabSnapshot, ViewerHandle,
};
pub use kind::TabKind;
pub use persist::SavedTab;
pub use registry::{FocusOptions, SelectOptions, TabRegistry};
pub use tab::{AddTab, ItemId, OnClose, Tab, TabData, LIBRARY_TAB_ID};

pub type Result<T> = std::result::Result<T, TabError>;
