//! The sync session actor.
//!
//! One task owns the canonical tree and is its only writer. Intents from
//! [`SessionHandle`]s, remote deliveries and save completions all arrive on
//! the same command channel and are handled strictly in order, so every
//! decision sees the tree as it is at handling time.
//!
//! ```text
//!   SessionHandle ──┐
//!   subscription ───┼──► mpsc ──► SessionActor ──► watch<SessionState>
//!   save tasks ─────┘                 │
//!                                     └─ debounce ──► save task ──► adapter
//! ```
//!
//! Saving: each applied mutation (re)arms the debounce timer. When it fires
//! the save start time is recorded for echo suppression, the local cache is
//! written synchronously, and a spawned task checks the remote and writes
//! the tree. A failed remote write is logged and not retried.
//!
//! At most one save is in flight. A debounce firing during a save queues a
//! single follow-up save of whatever the tree is when the first completes;
//! reset and clear wait for the running save before writing.

use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use campdir_store::{LocalCache, RemoteAdapter, SubscriptionEvent};
use campdir_tree::{Filters, Mutation, apply_filters};
use campdir_types::Tree;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tracing::{debug, info, trace, warn};

use crate::config::SyncConfig;
use crate::events::{ConnectionStatus, Phase, SessionState};
use crate::sync::{RemoteDecision, SyncManager};

// ============================================================================
// Error Type
// ============================================================================

/// Errors from the session handle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session shut down")]
    Shutdown,
}

// ============================================================================
// Commands (internal)
// ============================================================================

enum Command {
    Apply {
        mutation: Mutation,
        reply: oneshot::Sender<()>,
    },
    SetFilters {
        filters: Filters,
        reply: oneshot::Sender<()>,
    },
    ResetToSeed {
        reply: oneshot::Sender<()>,
    },
    ClearAll {
        reply: oneshot::Sender<bool>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },

    // From spawned tasks
    Remote(SubscriptionEvent),
    CacheRefresh(Tree),
    SaveFinished {
        seq: u64,
        remote_ok: bool,
    },
}

// ============================================================================
// SessionHandle (public API)
// ============================================================================

/// Cloneable handle to a running session.
///
/// Intent methods return once the actor has applied the change to its tree;
/// persistence happens later.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(command(reply)).map_err(|_| SessionError::Shutdown)?;
        rx.await.map_err(|_| SessionError::Shutdown)
    }

    /// Apply any mutation.
    pub async fn apply(&self, mutation: Mutation) -> Result<(), SessionError> {
        self.request(|reply| Command::Apply { mutation, reply }).await
    }

    async fn apply_creating(&self, mutation: Mutation) -> Result<String, SessionError> {
        let id = mutation.created_id().unwrap_or_default().to_string();
        self.apply(mutation).await?;
        Ok(id)
    }

    // ── Unions ───────────────────────────────────────────────────────────

    pub async fn edit_union_name(&self, union_id: &str, name: &str) -> Result<(), SessionError> {
        self.apply(Mutation::EditUnionName {
            union_id: union_id.to_string(),
            name: name.to_string(),
        })
        .await
    }

    /// Returns the new person's id.
    pub async fn add_union_person(
        &self,
        union_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<String, SessionError> {
        self.apply_creating(Mutation::add_union_person(union_id, name, phone))
            .await
    }

    pub async fn edit_union_person(
        &self,
        union_id: &str,
        person_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<(), SessionError> {
        self.apply(Mutation::EditUnionPerson {
            union_id: union_id.to_string(),
            person_id: person_id.to_string(),
            name: name.to_string(),
            phone,
        })
        .await
    }

    pub async fn delete_union_person(&self, union_id: &str, person_id: &str) -> Result<(), SessionError> {
        self.apply(Mutation::DeleteUnionPerson {
            union_id: union_id.to_string(),
            person_id: person_id.to_string(),
        })
        .await
    }

    // ── Wards ────────────────────────────────────────────────────────────

    /// Add a ward under a pouroshova region or a union. Returns the ward id.
    pub async fn add_ward(&self, parent_id: &str, name: &str) -> Result<String, SessionError> {
        self.apply_creating(Mutation::add_ward(parent_id, name)).await
    }

    pub async fn edit_ward(&self, parent_id: &str, ward_id: &str, name: &str) -> Result<(), SessionError> {
        self.apply(Mutation::EditWardName {
            parent_id: parent_id.to_string(),
            ward_id: ward_id.to_string(),
            name: name.to_string(),
        })
        .await
    }

    pub async fn delete_ward(&self, parent_id: &str, ward_id: &str) -> Result<(), SessionError> {
        self.apply(Mutation::DeleteWard {
            parent_id: parent_id.to_string(),
            ward_id: ward_id.to_string(),
        })
        .await
    }

    /// Returns the new person's id.
    pub async fn add_ward_person(
        &self,
        parent_id: &str,
        ward_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<String, SessionError> {
        self.apply_creating(Mutation::add_ward_person(parent_id, ward_id, name, phone))
            .await
    }

    pub async fn edit_ward_person(
        &self,
        parent_id: &str,
        ward_id: &str,
        person_id: &str,
        name: &str,
        phone: Option<String>,
    ) -> Result<(), SessionError> {
        self.apply(Mutation::EditWardPerson {
            parent_id: parent_id.to_string(),
            ward_id: ward_id.to_string(),
            person_id: person_id.to_string(),
            name: name.to_string(),
            phone,
        })
        .await
    }

    pub async fn delete_ward_person(
        &self,
        parent_id: &str,
        ward_id: &str,
        person_id: &str,
    ) -> Result<(), SessionError> {
        self.apply(Mutation::DeleteWardPerson {
            parent_id: parent_id.to_string(),
            ward_id: ward_id.to_string(),
            person_id: person_id.to_string(),
        })
        .await
    }

    // ── Session ──────────────────────────────────────────────────────────

    pub async fn set_filters(&self, filters: Filters) -> Result<(), SessionError> {
        self.request(|reply| Command::SetFilters { filters, reply }).await
    }

    /// Replace the tree with seed data everywhere and clear the filters.
    pub async fn reset_to_seed(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::ResetToSeed { reply }).await
    }

    /// Empty the tree locally and remotely. Returns whether the remote
    /// document was cleared.
    pub async fn clear_all(&self) -> Result<bool, SessionError> {
        self.request(|reply| Command::ClearAll { reply }).await
    }

    /// Save any pending change now and wait for in-flight saves.
    pub async fn flush(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Flush { reply }).await
    }

    /// Stop the session. A save still inside its debounce window is dropped.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    /// Latest published state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the initial tree is loaded.
    pub async fn wait_until_live(&self) -> Result<SessionState, SessionError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| s.phase == Phase::Live)
            .await
            .map_err(|_| SessionError::Shutdown)?;
        Ok(state.clone())
    }

    /// Wait until the remote has answered, live or not.
    ///
    /// Intents applied before the first subscription delivery can be
    /// replaced by it.
    pub async fn wait_until_connected(&self) -> Result<SessionState, SessionError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|s| s.phase == Phase::Live && s.connection != ConnectionStatus::Connecting)
            .await
            .map_err(|_| SessionError::Shutdown)?;
        Ok(state.clone())
    }
}

// ============================================================================
// SessionActor (owns all state)
// ============================================================================

struct SessionActor {
    adapter: Arc<RemoteAdapter>,
    cache: Arc<dyn LocalCache>,
    config: SyncConfig,
    sync: SyncManager,
    /// Weak so that dropping every handle stops the actor.
    tx: mpsc::WeakUnboundedSender<Command>,
    state_tx: watch::Sender<SessionState>,

    phase: Phase,
    tree: Arc<Tree>,
    filtered: Arc<Tree>,
    filters: Filters,
    connection: ConnectionStatus,
    version: u64,

    debounce: Option<Pin<Box<Sleep>>>,
    /// The one save allowed in flight.
    save_task: Option<JoinHandle<()>>,
    save_seq: u64,
    /// The debounce fired while a save was running.
    save_pending: bool,
    flush_waiters: Vec<oneshot::Sender<()>>,
    forwarder: Option<JoinHandle<()>>,
}

async fn wait_for(timer: &mut Option<Pin<Box<Sleep>>>) {
    if let Some(timer) = timer {
        timer.as_mut().await;
    }
}

impl SessionActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        self.start().await;

        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all session handles dropped");
                        break;
                    };
                    if self.handle(cmd).await.is_break() {
                        break;
                    }
                }
                _ = wait_for(&mut self.debounce), if self.debounce.is_some() => {
                    self.debounce = None;
                    self.start_save();
                }
            }
        }

        self.stop();
        debug!("session actor stopped");
    }

    /// Cache-first load, then subscribe.
    async fn start(&mut self) {
        match self.cache.load().filter(|tree| !tree.is_empty()) {
            Some(tree) => {
                info!(regions = tree.len(), "loaded tree from local cache");
                self.set_tree(tree);
                self.spawn_cache_refresh();
            }
            None => {
                info!("no local cache, loading from remote");
                let tree = self.adapter.read().await;
                if !tree.is_empty() {
                    self.store_local(&tree);
                }
                self.set_tree(tree);
            }
        }

        self.phase = Phase::Live;
        self.publish();
        self.open_subscription();
    }

    /// Refresh the local cache from the remote without touching the display.
    fn spawn_cache_refresh(&self) {
        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match adapter.try_read().await {
                Ok(Some(tree)) if !tree.is_empty() => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(Command::CacheRefresh(tree));
                    }
                }
                Ok(_) => debug!("remote has no tree for the local cache"),
                Err(e) => debug!(error = %e, "background refresh failed, keeping local cache"),
            }
        });
    }

    fn open_subscription(&mut self) {
        let mut subscription = self.adapter.subscribe();
        let tx = self.tx.clone();
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let Some(tx) = tx.upgrade() else { break };
                if tx.send(Command::Remote(event)).is_err() {
                    break;
                }
            }
        }));
    }

    async fn handle(&mut self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Apply { mutation, reply } => {
                self.apply(mutation);
                let _ = reply.send(());
            }
            Command::SetFilters { filters, reply } => {
                self.filters = filters;
                self.refilter();
                self.version += 1;
                self.publish();
                let _ = reply.send(());
            }
            Command::ResetToSeed { reply } => {
                self.reset().await;
                let _ = reply.send(());
            }
            Command::ClearAll { reply } => {
                let cleared = self.clear().await;
                let _ = reply.send(cleared);
            }
            Command::Flush { reply } => self.flush(reply),
            Command::Shutdown { reply } => {
                self.stop();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
            Command::Remote(event) => self.on_remote(event),
            Command::CacheRefresh(tree) => {
                // A local save already wrote something newer.
                if self.sync.last_save_at().is_none() {
                    self.store_local(&tree);
                    debug!("local cache refreshed from remote");
                }
            }
            Command::SaveFinished { seq, remote_ok } => self.on_save_finished(seq, remote_ok),
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, mutation: Mutation) {
        let op = mutation.name();
        let next = mutation.apply(Tree::clone(&self.tree));
        if next == *self.tree {
            debug!(op, "mutation changed nothing");
            return;
        }
        debug!(op, "mutation applied");
        self.set_tree(next);
        self.publish();
        self.debounce = Some(Box::pin(tokio::time::sleep(self.config.save_debounce())));
    }

    fn start_save(&mut self) {
        if self.save_task.is_some() {
            debug!("save in flight, queueing the latest tree");
            self.save_pending = true;
            return;
        }

        let tree = Arc::clone(&self.tree);
        if tree.is_empty() {
            debug!("not saving an empty tree");
            self.resolve_flush_waiters();
            return;
        }

        self.sync.record_save_started(Instant::now());
        self.store_local(&tree);
        self.save_seq += 1;
        let seq = self.save_seq;

        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        self.save_task = Some(tokio::spawn(async move {
            let remote_ok = if adapter.exists().await {
                adapter.write(&tree).await
            } else {
                debug!("remote unreachable, tree kept in local cache only");
                false
            };
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Command::SaveFinished { seq, remote_ok });
            }
        }));
        self.publish();
    }

    fn on_save_finished(&mut self, seq: u64, remote_ok: bool) {
        if seq != self.save_seq {
            trace!(seq, "ignoring completion of a save already awaited");
            return;
        }
        self.save_task = None;
        if remote_ok {
            info!("tree saved");
            self.connection = ConnectionStatus::Live;
        } else {
            warn!("tree saved to local cache only");
            self.connection = ConnectionStatus::LocalOnly;
        }
        if std::mem::take(&mut self.save_pending) {
            self.start_save();
        }
        if self.save_task.is_none() {
            self.resolve_flush_waiters();
        }
        self.publish();
    }

    /// Wait out the running save so nothing written afterwards is overtaken.
    /// Its completion message, still queued, is then ignored.
    async fn settle_save(&mut self) {
        self.debounce = None;
        self.save_pending = false;
        if let Some(task) = self.save_task.take() {
            debug!("waiting for the running save");
            let _ = task.await;
            self.save_seq += 1;
        }
    }

    fn flush(&mut self, reply: oneshot::Sender<()>) {
        if self.debounce.take().is_some() {
            self.start_save();
        }
        if self.save_task.is_none() {
            let _ = reply.send(());
        } else {
            self.flush_waiters.push(reply);
        }
    }

    fn resolve_flush_waiters(&mut self) {
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    fn on_remote(&mut self, event: SubscriptionEvent) {
        let before = self.connection;
        let tree = match event {
            SubscriptionEvent::Changed(tree) => {
                self.connection = ConnectionStatus::Live;
                tree
            }
            SubscriptionEvent::Fallback(tree) => {
                self.connection = ConnectionStatus::LocalOnly;
                tree
            }
        };

        let replaced = match self.sync.classify_remote(&self.tree, &tree, Instant::now()) {
            RemoteDecision::Echo => {
                debug!("ignoring remote update inside echo window");
                false
            }
            RemoteDecision::Unchanged => {
                trace!("remote tree matches local tree");
                false
            }
            RemoteDecision::Replace => {
                info!(regions = tree.len(), "adopting remote tree");
                self.store_local(&tree);
                self.set_tree(tree);
                true
            }
        };

        if replaced || self.connection != before {
            self.publish();
        }
    }

    async fn reset(&mut self) {
        self.settle_save().await;
        self.sync.record_save_started(Instant::now());
        let seed = self.adapter.reset().await;
        self.store_local(&seed);
        self.filters = Filters::default();
        self.set_tree(seed);
        self.resolve_flush_waiters();
        self.publish();
        info!("tree reset to seed");
    }

    async fn clear(&mut self) -> bool {
        self.settle_save().await;
        if let Err(e) = self.cache.clear() {
            warn!(error = %e, "failed to clear local cache");
        }
        self.sync.record_save_started(Instant::now());
        let cleared = self.adapter.exists().await && self.adapter.clear().await;
        if !cleared {
            warn!("remote unreachable, cleared locally only");
            self.connection = ConnectionStatus::LocalOnly;
        }
        self.set_tree(Vec::new());
        self.resolve_flush_waiters();
        self.publish();
        cleared
    }

    fn stop(&mut self) {
        if self.debounce.take().is_some() || std::mem::take(&mut self.save_pending) {
            warn!("dropping save still inside its debounce window");
        }
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }

    fn store_local(&self, tree: &Tree) {
        if let Err(e) = self.cache.store(tree) {
            warn!(error = %e, "failed to write local cache");
        }
    }

    fn set_tree(&mut self, tree: Tree) {
        self.tree = Arc::new(tree);
        self.refilter();
        self.version += 1;
    }

    fn refilter(&mut self) {
        self.filtered = if self.filters.is_empty() {
            Arc::clone(&self.tree)
        } else {
            Arc::new(apply_filters(&self.tree, &self.filters))
        };
    }

    fn publish(&self) {
        self.state_tx.send_replace(SessionState {
            phase: self.phase,
            tree: Arc::clone(&self.tree),
            filtered: Arc::clone(&self.filtered),
            filters: self.filters.clone(),
            connection: self.connection,
            saving: self.save_task.is_some(),
            version: self.version,
        });
    }
}

impl Drop for SessionActor {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

// ============================================================================
// Spawn
// ============================================================================

/// Start a session on the current tokio runtime.
pub fn spawn_session(adapter: Arc<RemoteAdapter>, cache: Arc<dyn LocalCache>, config: SyncConfig) -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionState::default());

    let actor = SessionActor {
        adapter,
        cache,
        sync: SyncManager::new(config.echo_window()),
        config,
        tx: tx.downgrade(),
        state_tx,
        phase: Phase::Loading,
        tree: Arc::default(),
        filtered: Arc::default(),
        filters: Filters::default(),
        connection: ConnectionStatus::Connecting,
        version: 0,
        debounce: None,
        save_task: None,
        save_seq: 0,
        save_pending: false,
        flush_waiters: Vec::new(),
        forwarder: None,
    };
    tokio::spawn(actor.run(rx));

    SessionHandle { tx, state: state_rx }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_store::{Fault, MemoryCache, MemoryDocumentService, SeedSource};
    use campdir_types::{Region, Ward};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn seed() -> Tree {
        vec![Region::with_wards(
            "region-satkania-pouroshova",
            "Satkania Pouroshova",
            vec![Ward {
                id: "ward-1".into(),
                name: "Ward-1".into(),
                persons: vec![],
            }],
        )]
    }

    fn foreign(name: &str) -> Tree {
        vec![Region::with_wards("region-foreign", name, vec![])]
    }

    struct Harness {
        service: Arc<MemoryDocumentService>,
        cache: Arc<MemoryCache>,
        session: SessionHandle,
    }

    fn harness(service: MemoryDocumentService, cache: MemoryCache) -> Harness {
        let service = Arc::new(service);
        let cache = Arc::new(cache);
        let adapter = Arc::new(RemoteAdapter::new(service.clone(), SeedSource::Inline(seed())));
        let session = spawn_session(adapter, cache.clone(), SyncConfig::default());
        Harness { service, cache, session }
    }

    /// Let every spawned task run to quiescence.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_uses_remote_and_fills_cache() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        let state = h.session.wait_until_live().await.unwrap();
        assert_eq!(*state.tree, seed());
        settle().await;

        assert_eq!(h.cache.load(), Some(seed()));
        assert_eq!(h.session.state().connection, ConnectionStatus::Live);
        assert_eq!(h.service.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_down_at_start() {
        let service = MemoryDocumentService::with_regions(foreign("remote"));
        service.configure(|f| {
            f.get = Some(Fault::Remote);
            f.watch = Some(Fault::Remote);
        });
        let h = harness(service, MemoryCache::new());

        let state = h.session.wait_until_live().await.unwrap();
        assert_eq!(*state.tree, seed());
        settle().await;
        assert_eq!(h.session.state().connection, ConnectionStatus::LocalOnly);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_with_unreachable_remote_saves_locally() {
        let service = MemoryDocumentService::with_regions(seed());
        let h = harness(service, MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        settle().await;

        h.service.configure(|f| f.get = Some(Fault::Remote));
        h.session.add_ward("region-satkania-pouroshova", "Ward-2").await.unwrap();
        h.session.flush().await.unwrap();

        let state = h.session.state();
        assert_eq!(state.connection, ConnectionStatus::LocalOnly);
        assert!(!state.saving);
        assert_eq!(h.service.write_count(), 0);
        assert_eq!(h.cache.load().as_ref(), Some(&*state.tree));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        settle().await;

        let id = h
            .session
            .add_ward_person("region-satkania-pouroshova", "ward-1", "Karim", Some("017".into()))
            .await
            .unwrap();
        h.session.flush().await.unwrap();

        assert_eq!(h.service.write_count(), 1);
        let written = &h.service.writes()[0];
        assert_eq!(written[0].direct_wards()[0].persons[0].id, id);
        assert_eq!(h.session.state().connection, ConnectionStatus::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_project_tree() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();

        let before = h.session.state();
        assert!(Arc::ptr_eq(&before.tree, &before.filtered));

        h.session
            .set_filters(Filters::new("region-satkania-pouroshova", "", "ward-9"))
            .await
            .unwrap();
        let state = h.session.state();
        assert!(state.filtered[0].direct_wards().is_empty());
        assert_eq!(*state.tree, seed());
        assert!(state.version > before.version);
        // Filtering is not a mutation.
        settle().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.service.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_noop_mutation_does_not_save() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        let before = h.session.state();

        h.session.delete_ward("region-satkania-pouroshova", "ward-missing").await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(Arc::ptr_eq(&before.tree, &h.session.state().tree));
        assert_eq!(h.service.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending_save() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();

        h.session.add_ward("region-satkania-pouroshova", "Ward-2").await.unwrap();
        h.session.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(h.service.write_count(), 0);
        assert!(matches!(
            h.session.add_ward("region-satkania-pouroshova", "Ward-3").await,
            Err(SessionError::Shutdown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_and_clear() {
        let h = harness(MemoryDocumentService::with_regions(foreign("remote")), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        h.session
            .set_filters(Filters::new("region-foreign", "", ""))
            .await
            .unwrap();

        h.session.reset_to_seed().await.unwrap();
        let state = h.session.state();
        assert_eq!(*state.tree, seed());
        assert!(state.filters.is_empty());
        assert_eq!(h.service.document().unwrap().regions, seed());

        assert!(h.session.clear_all().await.unwrap());
        assert!(h.session.state().tree.is_empty());
        assert_eq!(h.cache.load(), None);
        assert!(h.service.document().unwrap().regions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_waits_for_queued_save() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        settle().await;

        h.service.configure(|f| f.latency = Duration::from_secs(2));
        h.session.add_ward("region-satkania-pouroshova", "Ward-2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.session.state().saving);

        h.session.add_ward("region-satkania-pouroshova", "Ward-3").await.unwrap();
        h.session.flush().await.unwrap();

        let state = h.session.state();
        assert!(!state.saving);
        assert_eq!(h.service.write_count(), 2);
        assert_eq!(h.service.document().unwrap().regions, *state.tree);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_waits_for_running_save() {
        let h = harness(MemoryDocumentService::with_regions(seed()), MemoryCache::new());
        h.session.wait_until_live().await.unwrap();
        settle().await;

        h.service.configure(|f| f.latency = Duration::from_secs(2));
        h.session.add_ward("region-satkania-pouroshova", "Ward-2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(h.session.state().saving);

        h.session.reset_to_seed().await.unwrap();
        let writes = h.service.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1], seed());
        assert_eq!(h.service.document().unwrap().regions, seed());

        settle().await;
        let state = h.session.state();
        assert!(!state.saving);
        assert_eq!(*state.tree, seed());
    }
}
