//! Published session state.

use std::sync::Arc;

use campdir_tree::Filters;
use campdir_types::Tree;
use strum::{AsRefStr, Display};

/// Startup phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// The initial tree has not been loaded yet.
    #[default]
    Loading,
    /// A tree is displayed and the subscription is running.
    Live,
}

/// Connection indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionStatus {
    /// Nothing heard from the remote yet.
    #[default]
    Connecting,
    /// The subscription delivered or a save reached the remote.
    Live,
    /// The remote is unreachable; saves only reach the local cache.
    LocalOnly,
}

/// Snapshot published on every change.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub phase: Phase,
    /// The canonical tree.
    pub tree: Arc<Tree>,
    /// `tree` projected through `filters`.
    pub filtered: Arc<Tree>,
    pub filters: Filters,
    pub connection: ConnectionStatus,
    /// A save is in flight.
    pub saving: bool,
    /// Bumped whenever `tree` or `filters` change.
    pub version: u64,
}
