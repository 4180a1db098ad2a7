//! Document service backed by a JSON file.
//!
//! Several processes pointing at the same file see each other's writes via
//! a `notify` watcher on the file's directory. Writes go through a sibling
//! temp file and a rename so watchers never read a half-written document.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campdir_types::Tree;
use futures::{StreamExt, future, stream};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::document::RemoteDocument;
use crate::error::{StoreError, StoreResult};
use crate::service::{DocumentService, Watch};

/// File-backed document service.
#[derive(Clone, Debug)]
pub struct FsDocumentService {
    path: PathBuf,
}

impl FsDocumentService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    async fn read_document(&self) -> StoreResult<Option<RemoteDocument>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e, &self.path)),
        }
    }

    async fn write_document(&self, document: &RemoteDocument) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        tokio::fs::create_dir_all(self.dir())
            .await
            .map_err(|e| map_io(e, self.dir()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await.map_err(|e| map_io(e, &tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| map_io(e, &self.path))?;
        tracing::trace!(path = %self.path.display(), "document written");
        Ok(())
    }

    fn is_document_event(&self, event: &Event) -> bool {
        let interesting = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        );
        interesting
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }
}

fn map_io(e: io::Error, path: &Path) -> StoreError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => StoreError::permission_denied(path.display().to_string()),
        _ => StoreError::Io(e),
    }
}

#[async_trait]
impl DocumentService for FsDocumentService {
    fn name(&self) -> &str {
        "fs"
    }

    async fn get(&self) -> StoreResult<Option<RemoteDocument>> {
        self.read_document().await
    }

    async fn update(&self, regions: &Tree, last_updated: u64) -> StoreResult<()> {
        let Some(mut document) = self.read_document().await? else {
            return Err(StoreError::not_found(self.path.display().to_string()));
        };
        document.regions = regions.clone();
        document.last_updated = last_updated;
        self.write_document(&document).await
    }

    async fn set(&self, document: RemoteDocument) -> StoreResult<()> {
        self.write_document(&document).await
    }

    async fn watch(&self) -> StoreResult<Watch> {
        let (tx, rx) = mpsc::channel::<()>(16);
        let filter = self.clone();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) if filter.is_document_event(&event) => {
                    // A full channel already has a pending re-read queued.
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "document watcher error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| StoreError::remote(format!("failed to create watcher: {e}")))?;

        tokio::fs::create_dir_all(self.dir())
            .await
            .map_err(|e| map_io(e, self.dir()))?;
        watcher
            .watch(self.dir(), RecursiveMode::NonRecursive)
            .map_err(|e| StoreError::remote(format!("failed to watch {}: {e}", self.dir().display())))?;
        tracing::debug!(path = %self.path.display(), "document watcher started");

        let current = self.read_document().await;
        let last = current.as_ref().ok().cloned().flatten();

        struct State {
            service: FsDocumentService,
            rx: mpsc::Receiver<()>,
            last: Option<RemoteDocument>,
            _watcher: RecommendedWatcher,
        }

        let state = State {
            service: self.clone(),
            rx,
            last,
            _watcher: watcher,
        };

        // Re-read on every file event; identical consecutive reads collapse.
        let changes = stream::unfold(state, |mut state| async move {
            loop {
                state.rx.recv().await?;
                match state.service.read_document().await {
                    Ok(document) if document == state.last => continue,
                    Ok(document) => {
                        state.last = document.clone();
                        return Some((Ok(document), state));
                    }
                    // A reader can race a writer on platforms without atomic
                    // rename; the next event re-reads.
                    Err(StoreError::Json(e)) => {
                        tracing::debug!(error = %e, "skipping partial document read");
                        continue;
                    }
                    Err(e) => return Some((Err(e), state)),
                }
            }
        });

        Ok(stream::once(future::ready(current)).chain(changes).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_types::{Person, Region, Ward};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn tree() -> Tree {
        vec![Region::with_wards(
            "region-p",
            "P",
            vec![Ward {
                id: "w1".into(),
                name: "Ward-1".into(),
                persons: vec![Person {
                    id: "p1".into(),
                    name: "X".into(),
                    phone: None,
                }],
            }],
        )]
    }

    #[tokio::test]
    async fn test_missing_file_is_missing_document() {
        let dir = TempDir::new().unwrap();
        let service = FsDocumentService::new(dir.path().join("doc.json"));
        assert_eq!(service.get().await.unwrap(), None);
        assert!(matches!(
            service.update(&tree(), 1).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_set_update_get() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let service = FsDocumentService::new(&path);

        service.set(RemoteDocument::new(vec![])).await.unwrap();
        service.update(&tree(), 99).await.unwrap();

        let doc = service.get().await.unwrap().unwrap();
        assert_eq!(doc.regions, tree());
        assert_eq!(doc.last_updated, 99);
        assert_eq!(doc.version, "1.0");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("phone"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ nope").unwrap();
        let service = FsDocumentService::new(&path);
        assert!(matches!(service.get().await.unwrap_err(), StoreError::Json(_)));
    }

    #[tokio::test]
    async fn test_watch_starts_with_current_state() {
        let dir = TempDir::new().unwrap();
        let service = FsDocumentService::new(dir.path().join("doc.json"));
        service.set(RemoteDocument::new(tree())).await.unwrap();

        let mut watch = service.watch().await.unwrap();
        let first = watch.next().await.unwrap().unwrap().unwrap();
        assert_eq!(first.regions, tree());
    }
}
