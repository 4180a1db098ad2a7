//! In-process document service.
//!
//! Backs tests and offline runs. Faults and latency can be injected per
//! operation. Successful writes are counted, and the most recent
//! [`WRITE_LOG_CAPACITY`] written trees are kept for inspection.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use campdir_types::Tree;
use futures::{StreamExt, future, stream};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::document::RemoteDocument;
use crate::error::{StoreError, StoreResult};
use crate::service::{DocumentService, Watch};

const CHANGE_CAPACITY: usize = 64;

/// Written trees retained by [`MemoryDocumentService::writes`]; older ones are dropped.
pub const WRITE_LOG_CAPACITY: usize = 32;

/// An injectable failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    NotFound,
    PermissionDenied,
    Remote,
}

impl Fault {
    fn into_error(self, op: &str) -> StoreError {
        match self {
            Fault::NotFound => StoreError::not_found(format!("memory document ({op})")),
            Fault::PermissionDenied => StoreError::permission_denied(format!("memory document ({op})")),
            Fault::Remote => StoreError::remote(format!("injected {op} failure")),
        }
    }
}

/// Per-operation fault configuration.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    /// Delay applied before every operation.
    pub latency: Duration,
    pub get: Option<Fault>,
    pub update: Option<Fault>,
    pub set: Option<Fault>,
    pub watch: Option<Fault>,
}

type Change = Result<Option<RemoteDocument>, Fault>;

struct Inner {
    document: Option<RemoteDocument>,
    faults: Faults,
    writes: VecDeque<Tree>,
    write_total: usize,
    gets: usize,
}

/// In-memory document service with broadcast fan-out to watchers.
pub struct MemoryDocumentService {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryDocumentService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentService {
    /// A service with no document.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                document: None,
                faults: Faults::default(),
                writes: VecDeque::new(),
                write_total: 0,
                gets: 0,
            }),
            changes,
        }
    }

    /// A service whose document already holds `regions`.
    pub fn with_regions(regions: Tree) -> Self {
        let service = Self::new();
        service.inner.lock().document = Some(RemoteDocument::new(regions));
        service
    }

    /// Adjust the fault configuration.
    pub fn configure(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.inner.lock().faults);
    }

    /// Remove every injected fault and latency.
    pub fn heal(&self) {
        self.inner.lock().faults = Faults::default();
    }

    /// Current document, bypassing faults.
    pub fn document(&self) -> Option<RemoteDocument> {
        self.inner.lock().document.clone()
    }

    /// The last trees written through `update`/`set`, oldest first.
    pub fn writes(&self) -> Vec<Tree> {
        self.inner.lock().writes.iter().cloned().collect()
    }

    /// Successful writes since creation, including ones dropped from the log.
    pub fn write_count(&self) -> usize {
        self.inner.lock().write_total
    }

    /// Open watch streams.
    pub fn watcher_count(&self) -> usize {
        self.changes.receiver_count()
    }

    pub fn get_count(&self) -> usize {
        self.inner.lock().gets
    }

    /// Simulate another client replacing the document.
    pub fn push_remote(&self, regions: Tree) {
        let document = RemoteDocument::new(regions);
        self.inner.lock().document = Some(document.clone());
        let _ = self.changes.send(Ok(Some(document)));
    }

    /// Simulate the document being deleted.
    pub fn remove_document(&self) {
        self.inner.lock().document = None;
        let _ = self.changes.send(Ok(None));
    }

    /// Terminate every open watch with `fault`.
    pub fn break_watchers(&self, fault: Fault) {
        let _ = self.changes.send(Err(fault));
    }

    async fn delay(&self) {
        let latency = self.inner.lock().faults.latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn commit(&self, document: RemoteDocument) {
        {
            let mut inner = self.inner.lock();
            if inner.writes.len() == WRITE_LOG_CAPACITY {
                inner.writes.pop_front();
            }
            inner.writes.push_back(document.regions.clone());
            inner.write_total += 1;
            inner.document = Some(document.clone());
        }
        let _ = self.changes.send(Ok(Some(document)));
    }
}

#[async_trait]
impl DocumentService for MemoryDocumentService {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self) -> StoreResult<Option<RemoteDocument>> {
        self.delay().await;
        let mut inner = self.inner.lock();
        inner.gets += 1;
        if let Some(fault) = inner.faults.get {
            return Err(fault.into_error("get"));
        }
        Ok(inner.document.clone())
    }

    async fn update(&self, regions: &Tree, last_updated: u64) -> StoreResult<()> {
        self.delay().await;
        let document = {
            let inner = self.inner.lock();
            if let Some(fault) = inner.faults.update {
                return Err(fault.into_error("update"));
            }
            let Some(existing) = &inner.document else {
                return Err(StoreError::not_found("memory document"));
            };
            RemoteDocument {
                regions: regions.clone(),
                last_updated,
                version: existing.version.clone(),
            }
        };
        self.commit(document);
        Ok(())
    }

    async fn set(&self, document: RemoteDocument) -> StoreResult<()> {
        self.delay().await;
        if let Some(fault) = self.inner.lock().faults.set {
            return Err(fault.into_error("set"));
        }
        self.commit(document);
        Ok(())
    }

    async fn watch(&self) -> StoreResult<Watch> {
        self.delay().await;
        if let Some(fault) = self.inner.lock().faults.watch {
            return Err(fault.into_error("watch"));
        }

        // Subscribe before snapshotting so no change falls in between.
        let rx = self.changes.subscribe();
        let current = self.inner.lock().document.clone();

        let changes = stream::unfold(Some(rx), |state| async move {
            let mut rx = state?;
            loop {
                match rx.recv().await {
                    Ok(Ok(document)) => return Some((Ok(document), Some(rx))),
                    Ok(Err(fault)) => return Some((Err(fault.into_error("watch")), None)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "memory watcher lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Ok(stream::once(future::ready(Ok(current))).chain(changes).boxed())
    }
}
