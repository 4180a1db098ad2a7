//! Remote document adapter.
//!
//! Wraps one [`DocumentService`] behind operations that never fail loudly:
//! reads fall back to seed data, writes report a boolean, and subscriptions
//! degrade to a single seed delivery. A short-lived read cache avoids
//! redundant round trips.
//!
//! ```text
//!   read()  ──► read cache fresh? ──yes──► cached tree
//!                    │ no
//!                    ▼
//!               get() within timeout ──doc──► cache + return
//!                    │ missing          │ error / timeout
//!                    ▼                  ▼
//!          seed (+ background set)     seed
//! ```

use std::sync::Arc;
use std::time::Duration;

use campdir_types::{Tree, now_millis};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::document::RemoteDocument;
use crate::error::{StoreError, StoreResult};
use crate::seed::SeedSource;
use crate::service::DocumentService;

/// Deadline for a remote point read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(3000);

/// How long a successful read or write satisfies later reads.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(30_000);

const SUBSCRIPTION_BUFFER: usize = 16;

struct CachedRead {
    tree: Tree,
    at: Instant,
}

/// Adapter over the single remote document.
pub struct RemoteAdapter {
    service: Arc<dyn DocumentService>,
    seed: SeedSource,
    read_timeout: Duration,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedRead>>,
    /// Background seed write started by `read`; later writes wait for it.
    initialising: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteAdapter {
    pub fn new(service: Arc<dyn DocumentService>, seed: SeedSource) -> Self {
        Self {
            service,
            seed,
            read_timeout: DEFAULT_READ_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(None),
            initialising: Mutex::new(None),
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn seed(&self) -> &SeedSource {
        &self.seed
    }

    /// Drop the read cache so the next read goes to the service.
    pub fn invalidate_cache(&self) {
        *self.cache.lock() = None;
    }

    fn cached(&self) -> Option<Tree> {
        let cache = self.cache.lock();
        cache
            .as_ref()
            .filter(|c| c.at.elapsed() < self.cache_ttl)
            .map(|c| c.tree.clone())
    }

    fn remember(&self, tree: Tree) {
        *self.cache.lock() = Some(CachedRead {
            tree,
            at: Instant::now(),
        });
    }

    /// Point read with timeout. `Ok(None)` if the document does not exist.
    pub async fn try_read(&self) -> StoreResult<Option<Tree>> {
        if let Some(tree) = self.cached() {
            tracing::trace!("remote read served from cache");
            return Ok(Some(tree));
        }

        let document = tokio::time::timeout(self.read_timeout, self.service.get())
            .await
            .map_err(|_| StoreError::Timeout(self.read_timeout))??;

        Ok(document.map(|doc| {
            self.remember(doc.regions.clone());
            doc.regions
        }))
    }

    /// Read the tree, falling back to seed data on any failure.
    ///
    /// A missing document is initialised with the seed in the background;
    /// the seed is returned without waiting for that write. Writes issued
    /// afterwards wait for it, so the seed never lands on top of them.
    pub async fn read(&self) -> Tree {
        match self.try_read().await {
            Ok(Some(tree)) => {
                tracing::debug!(regions = tree.len(), "remote tree loaded");
                tree
            }
            Ok(None) => {
                tracing::info!(service = self.service.name(), "no remote document, initialising from seed");
                let seed = self.seed.load().await;
                let service = Arc::clone(&self.service);
                let document = RemoteDocument::new(seed.clone());
                let task = tokio::spawn(async move {
                    match service.set(document).await {
                        Ok(()) => tracing::info!("remote document initialised in background"),
                        Err(e) => tracing::warn!(error = %e, "background initialisation failed"),
                    }
                });
                *self.initialising.lock() = Some(task);
                seed
            }
            Err(e @ StoreError::Timeout(_)) => {
                tracing::info!(error = %e, "remote read timed out, using seed");
                self.seed.load().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote read failed, using seed");
                self.seed.load().await
            }
        }
    }

    /// Write the tree. A partial update is tried first; a missing or
    /// protected document is then replaced wholesale.
    pub async fn write(&self, tree: &Tree) -> bool {
        self.await_initialisation().await;

        tracing::debug!(regions = tree.len(), "writing remote tree");
        match self.service.update(tree, now_millis()).await {
            Ok(()) => {}
            Err(e) if e.wants_full_write() => {
                tracing::debug!(error = %e, "update rejected, writing full document");
                if let Err(e) = self.service.set(RemoteDocument::new(tree.clone())).await {
                    tracing::error!(error = %e, "failed to create remote document");
                    return false;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to write remote tree");
                return false;
            }
        }
        self.remember(tree.clone());
        true
    }

    async fn await_initialisation(&self) {
        let pending = self.initialising.lock().take();
        if let Some(pending) = pending {
            let _ = pending.await;
        }
    }

    /// Connectivity check. Never fails; a slow service counts as offline.
    pub async fn exists(&self) -> bool {
        match tokio::time::timeout(self.read_timeout, self.service.get()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "connection check failed");
                false
            }
            Err(_) => {
                tracing::debug!("connection check timed out");
                false
            }
        }
    }

    /// Replace the remote tree with seed data and return it.
    ///
    /// The seed is returned even if the write fails.
    pub async fn reset(&self) -> Tree {
        let seed = self.seed.load().await;
        if self.write(&seed).await {
            tracing::info!("remote tree reset to seed");
        } else {
            tracing::warn!("failed to write seed to remote");
        }
        seed
    }

    /// Empty the remote tree.
    pub async fn clear(&self) -> bool {
        self.await_initialisation().await;
        match self.service.update(&Vec::new(), now_millis()).await {
            Ok(()) => {
                self.remember(Vec::new());
                tracing::info!("remote tree cleared");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to clear remote tree");
                false
            }
        }
    }

    /// Follow remote changes.
    ///
    /// Every change is delivered, including this process's own writes. A
    /// missing document is initialised with the seed and the seed
    /// delivered. If the feed fails the seed is delivered once as a
    /// [`SubscriptionEvent::Fallback`] and the subscription ends.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let service = Arc::clone(&self.service);
        let seed = self.seed.clone();

        let task = tokio::spawn(async move {
            let mut watch = match service.watch().await {
                Ok(watch) => watch,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to open subscription, delivering seed");
                    let _ = tx.send(SubscriptionEvent::Fallback(seed.load().await)).await;
                    return;
                }
            };
            tracing::debug!(service = service.name(), "subscription open");

            while let Some(change) = watch.next().await {
                let tree = match change {
                    Ok(Some(document)) => document.regions,
                    Ok(None) => initialise(service.as_ref(), &seed).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "subscription failed, delivering seed");
                        let _ = tx.send(SubscriptionEvent::Fallback(seed.load().await)).await;
                        return;
                    }
                };
                if tx.send(SubscriptionEvent::Changed(tree)).await.is_err() {
                    break;
                }
            }
            tracing::debug!("subscription closed");
        });

        Subscription {
            rx,
            _task: AbortOnDrop(task.abort_handle()),
        }
    }
}

/// Create the document from seed data, returning the seed.
async fn initialise(service: &dyn DocumentService, seed: &SeedSource) -> Tree {
    tracing::info!("remote document missing, initialising from seed");
    let tree = seed.load().await;
    if let Err(e) = service.set(RemoteDocument::new(tree.clone())).await {
        tracing::warn!(error = %e, "failed to initialise remote document");
    }
    tree
}

/// Aborts a tokio task when dropped.
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One delivery from a [`Subscription`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// The remote document changed (or was just initialised).
    Changed(Tree),
    /// The feed failed; this is seed data and nothing follows.
    Fallback(Tree),
}

impl SubscriptionEvent {
    pub fn tree(&self) -> &Tree {
        match self {
            SubscriptionEvent::Changed(tree) | SubscriptionEvent::Fallback(tree) => tree,
        }
    }

    pub fn into_tree(self) -> Tree {
        match self {
            SubscriptionEvent::Changed(tree) | SubscriptionEvent::Fallback(tree) => tree,
        }
    }
}

/// A live feed of remote trees. Dropping it stops delivery.
pub struct Subscription {
    rx: mpsc::Receiver<SubscriptionEvent>,
    _task: AbortOnDrop,
}

impl Subscription {
    /// Next delivery, or `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        self.rx.recv().await
    }

    /// Stop delivery.
    pub fn unsubscribe(self) {}
}
