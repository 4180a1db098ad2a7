//! Local-first sync core for campdir.
//!
//! A [`SessionHandle`] fronts a single actor that owns the directory tree:
//!
//! - startup renders the local cache immediately and refreshes from the
//!   remote document in the background
//! - mutations are applied at once and persisted after a quiet period
//!   ([`constants::SAVE_DEBOUNCE`])
//! - remote changes are adopted unless they are our own write echoing back
//!   ([`SyncManager`]) or identical to what is displayed
//!
//! State is published through a `tokio::sync::watch` channel as
//! [`SessionState`].

pub mod config;
pub mod constants;
pub mod events;
pub mod session;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use events::{ConnectionStatus, Phase, SessionState};
pub use session::{SessionError, SessionHandle, spawn_session};
pub use sync::{RemoteDecision, SyncManager};
