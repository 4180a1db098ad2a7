//! Remote-change policy for a local-first session.
//!
//! The session writes the whole tree and also subscribes to the document it
//! writes, so every save comes back as a "remote" change. There is no write
//! id to correlate on; a save is recognised purely by timing.
//!
//! # Decision
//!
//! ```text
//! remote tree arrives
//!     │
//!     ├─ now - last_save_at < echo_window ──► Echo       (ignored)
//!     ├─ incoming == current                ──► Unchanged  (no re-render)
//!     └─ otherwise                          ──► Replace
//! ```
//!
//! Two clients saving within one echo window of each other can lose the
//! other's change. Conflicts are last-write-wins by construction.

use std::time::Duration;

use campdir_types::Tree;
use tokio::time::Instant;

use crate::constants::ECHO_WINDOW;

/// What to do with a tree delivered by the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    /// Arrived inside the echo window of our own save.
    Echo,
    /// Identical to what we hold.
    Unchanged,
    /// Adopt the incoming tree.
    Replace,
}

/// Echo-suppression state for one session.
#[derive(Debug, Clone)]
pub struct SyncManager {
    echo_window: Duration,
    /// When the most recent save started. `None` until the first save.
    last_save_at: Option<Instant>,
    /// Bumped on every adopted remote tree.
    version: u64,
    echoes: u64,
}

impl Default for SyncManager {
    fn default() -> Self {
        Self::new(ECHO_WINDOW)
    }
}

impl SyncManager {
    pub fn new(echo_window: Duration) -> Self {
        Self {
            echo_window,
            last_save_at: None,
            version: 0,
            echoes: 0,
        }
    }

    /// Note that a save is starting now.
    pub fn record_save_started(&mut self, now: Instant) {
        self.last_save_at = Some(now);
    }

    pub fn last_save_at(&self) -> Option<Instant> {
        self.last_save_at
    }

    /// Whether `now` falls inside the echo window of the last save.
    pub fn in_echo_window(&self, now: Instant) -> bool {
        self.last_save_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.echo_window)
    }

    /// Classify a remote delivery against the tree held right now.
    pub fn classify_remote(&mut self, current: &Tree, incoming: &Tree, now: Instant) -> RemoteDecision {
        if self.in_echo_window(now) {
            self.echoes += 1;
            return RemoteDecision::Echo;
        }
        if current == incoming {
            return RemoteDecision::Unchanged;
        }
        self.version += 1;
        RemoteDecision::Replace
    }

    /// Number of remote trees adopted so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of deliveries suppressed as echoes.
    pub fn echoes_suppressed(&self) -> u64 {
        self.echoes
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use campdir_types::Region;

    fn tree(name: &str) -> Tree {
        vec![Region::with_wards("r", name, vec![])]
    }

    #[test]
    fn test_no_save_means_no_echo() {
        let mut sync = SyncManager::default();
        let now = Instant::now();
        assert!(!sync.in_echo_window(now));
        assert_eq!(sync.classify_remote(&tree("a"), &tree("a"), now), RemoteDecision::Unchanged);
        assert_eq!(sync.classify_remote(&tree("a"), &tree("b"), now), RemoteDecision::Replace);
        assert_eq!(sync.version(), 1);
    }

    #[test]
    fn test_echo_window_boundaries() {
        let mut sync = SyncManager::default();
        let saved = Instant::now();
        sync.record_save_started(saved);

        let early = saved + Duration::from_millis(1500);
        assert_eq!(sync.classify_remote(&tree("a"), &tree("b"), early), RemoteDecision::Echo);

        let edge = saved + Duration::from_millis(2999);
        assert_eq!(sync.classify_remote(&tree("a"), &tree("b"), edge), RemoteDecision::Echo);

        let after = saved + ECHO_WINDOW;
        assert_eq!(sync.classify_remote(&tree("a"), &tree("b"), after), RemoteDecision::Replace);

        assert_eq!(sync.echoes_suppressed(), 2);
        assert_eq!(sync.version(), 1);
    }

    #[test]
    fn test_echo_even_when_content_differs() {
        // Timing alone decides; a concurrent foreign write inside the window
        // is dropped.
        let mut sync = SyncManager::new(Duration::from_secs(3));
        let saved = Instant::now();
        sync.record_save_started(saved);
        let decision = sync.classify_remote(&tree("mine"), &tree("theirs"), saved + Duration::from_secs(1));
        assert_eq!(decision, RemoteDecision::Echo);
    }

    #[test]
    fn test_later_save_extends_window() {
        let mut sync = SyncManager::default();
        let first = Instant::now();
        sync.record_save_started(first);
        sync.record_save_started(first + Duration::from_secs(2));
        assert!(sync.in_echo_window(first + Duration::from_secs(4)));
        assert!(!sync.in_echo_window(first + Duration::from_secs(5)));
    }
}
