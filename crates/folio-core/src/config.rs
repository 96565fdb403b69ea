//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use folio_tabs::{max_loaded_tabs_for_memory, TabsConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file holding persisted UI state
    pub database_path: PathBuf,
    /// Tab strip limits and timers
    pub tabs: TabsConfig,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("folio.db"),
            tabs: TabsConfig::default().with_max_loaded_tabs(detect_max_loaded_tabs()),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Folio"))
            .unwrap_or_else(|| PathBuf::from(".folio"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

/// Read total RAM once at startup; the limit is not recomputed later
fn detect_max_loaded_tabs() -> usize {
    use sysinfo::{MemoryRefreshKind, RefreshKind, System};

    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
    );
    let total = sys.total_memory();
    let max_loaded_tabs = max_loaded_tabs_for_memory(total);

    tracing::debug!(total_memory = total, max_loaded_tabs, "Derived loaded tab limit");
    max_loaded_tabs
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
