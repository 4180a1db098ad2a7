//! Synchronous local copy of the tree.
//!
//! Read once at startup for instant display, written on every save as a
//! backup. The cache file holds a bare `Region[]` array.

use std::io;
use std::path::{Path, PathBuf};

use campdir_types::Tree;
use parking_lot::Mutex;

use crate::error::CacheError;

/// A local key-value slot holding one tree.
pub trait LocalCache: Send + Sync {
    /// The cached tree, or `None` if absent or unreadable.
    fn load(&self) -> Option<Tree>;

    fn store(&self, tree: &Tree) -> Result<(), CacheError>;

    fn clear(&self) -> Result<(), CacheError>;
}

/// JSON file cache.
#[derive(Clone, Debug)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> Option<Tree> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read local cache");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(tree) => Some(tree),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt local cache");
                None
            }
        }
    }

    fn store(&self, tree: &Tree) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(tree)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory cache for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<Tree>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(tree: Tree) -> Self {
        Self {
            slot: Mutex::new(Some(tree)),
        }
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> Option<Tree> {
        self.slot.lock().clone()
    }

    fn store(&self, tree: &Tree) -> Result<(), CacheError> {
        *self.slot.lock() = Some(tree.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_types::Region;
    use tempfile::TempDir;

    #[test]
    fn test_file_cache_lifecycle() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("sub").join("cache.json"));
        assert_eq!(cache.load(), None);

        let tree = vec![Region::with_wards("r", "R", vec![])];
        cache.store(&tree).unwrap();
        assert_eq!(cache.load(), Some(tree));

        let raw = std::fs::read_to_string(cache.path()).unwrap();
        assert!(raw.starts_with('['));

        cache.clear().unwrap();
        assert_eq!(cache.load(), None);
        // Clearing twice is fine.
        cache.clear().unwrap();
    }

    #[test]
    fn test_corrupt_cache_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(FileCache::new(path).load(), None);
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        assert_eq!(cache.load(), None);
        cache.store(&vec![]).unwrap();
        assert_eq!(cache.load(), Some(vec![]));
        cache.clear().unwrap();
        assert_eq!(cache.load(), None);
    }
}
