//! Folio Storage Layer
//!
//! SQLite-backed key/value store for UI state that must survive restarts,
//! such as the tab strip snapshot.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
