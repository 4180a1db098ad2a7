//! Sync session configuration.
//!
//! Loaded from RON; every field is optional and falls back to
//! [`constants`](crate::constants).
//!
//! ```ron
//! (
//!     save_debounce_ms: 1000,
//!     echo_window_ms: 3000,
//!     read_timeout_ms: 3000,
//!     read_cache_ttl_ms: 30000,
//! )
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use campdir_store::{DocumentService, RemoteAdapter, SeedSource};
use serde::{Deserialize, Serialize};

use crate::constants::{ECHO_WINDOW, READ_CACHE_TTL, READ_TIMEOUT, SAVE_DEBOUNCE};

/// Error loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Timing knobs of the sync core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub save_debounce_ms: u64,
    pub echo_window_ms: u64,
    pub read_timeout_ms: u64,
    pub read_cache_ttl_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: SAVE_DEBOUNCE.as_millis() as u64,
            echo_window_ms: ECHO_WINDOW.as_millis() as u64,
            read_timeout_ms: READ_TIMEOUT.as_millis() as u64,
            read_cache_ttl_ms: READ_CACHE_TTL.as_millis() as u64,
        }
    }
}

impl SyncConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn read_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.read_cache_ttl_ms)
    }

    /// A remote adapter using these timings.
    pub fn build_adapter(&self, service: Arc<dyn DocumentService>, seed: SeedSource) -> RemoteAdapter {
        RemoteAdapter::new(service, seed)
            .with_read_timeout(self.read_timeout())
            .with_cache_ttl(self.read_cache_ttl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.save_debounce(), SAVE_DEBOUNCE);
        assert_eq!(config.echo_window(), ECHO_WINDOW);
        assert_eq!(config.read_timeout(), READ_TIMEOUT);
        assert_eq!(config.read_cache_ttl(), READ_CACHE_TTL);
    }

    #[test]
    fn test_partial_ron() {
        let config = SyncConfig::from_ron("(save_debounce_ms: 250)").unwrap();
        assert_eq!(config.save_debounce(), Duration::from_millis(250));
        assert_eq!(config.echo_window(), ECHO_WINDOW);
    }

    #[test]
    fn test_bad_ron() {
        assert!(matches!(
            SyncConfig::from_ron("(save_debounce_ms: \"soon\")"),
            Err(ConfigError::Ron(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = SyncConfig::load(Path::new("/nonexistent/campdir/sync.ron")).unwrap();
        assert_eq!(config, SyncConfig::default());
    }
}
