//! Sync timing defaults.
//!
//! Every value here can be overridden through [`SyncConfig`](crate::SyncConfig).

use std::time::Duration;

/// Quiet period after the last mutation before the tree is persisted.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Remote deliveries arriving this soon after a save started are treated as
/// our own write echoing back and ignored.
pub const ECHO_WINDOW: Duration = Duration::from_millis(3000);

/// Deadline for a remote point read.
pub const READ_TIMEOUT: Duration = campdir_store::DEFAULT_READ_TIMEOUT;

/// Lifetime of the adapter's read cache.
pub const READ_CACHE_TTL: Duration = campdir_store::DEFAULT_CACHE_TTL;
