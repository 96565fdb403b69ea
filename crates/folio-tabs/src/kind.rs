//! Tab kinds and the document tab state machine
//!
//! ```text
//! Reader
//!   ↓ unload (idle timeout / too many loaded)
//! ReaderUnloaded
//!   ↓ reload (selected again)
//! Reader
//! ```
//!
//! `Library` is the permanent collection view and never changes kind.

use serde::{Deserialize, Serialize};

use crate::error::TabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabKind {
    /// The main collection view, always at index 0
    Library,
    /// A document tab with a live viewer
    Reader,
    /// A document tab whose viewer has been released; only title and data remain
    ReaderUnloaded,
}

impl TabKind {
    /// Check if transition to another kind is valid
    pub fn can_transition_to(&self, target: TabKind) -> bool {
        match (self, target) {
            (TabKind::Reader, TabKind::ReaderUnloaded) => true,
            (TabKind::ReaderUnloaded, TabKind::Reader) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    /// Returns true for tabs backed by a document
    pub fn is_document(&self) -> bool {
        matches!(self, TabKind::Reader | TabKind::ReaderUnloaded)
    }

    /// Returns true if the viewer resource is released
    pub fn is_unloaded(&self) -> bool {
        matches!(self, TabKind::ReaderUnloaded)
    }

    /// The kind written to persisted state; unloaded tabs are saved as readers
    pub fn persisted(&self) -> TabKind {
        match self {
            TabKind::ReaderUnloaded => TabKind::Reader,
            other => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabKind::Library => "library",
            TabKind::Reader => "reader",
            TabKind::ReaderUnloaded => "reader-unloaded",
        }
    }
}

impl std::fmt::Display for TabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TabKind {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "library" => Ok(TabKind::Library),
            "reader" => Ok(TabKind::Reader),
            "reader-unloaded" => Ok(TabKind::ReaderUnloaded),
            _ => Err(TabError::InvalidArgument(format!("Unknown tab type: {}", s))),
        }
    }
}
