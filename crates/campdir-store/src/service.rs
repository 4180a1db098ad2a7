//! The document service abstraction.
//!
//! A document service stores exactly one [`RemoteDocument`] and tells
//! watchers whenever it changes. Implementations must be usable from many
//! tasks at once.

use async_trait::async_trait;
use campdir_types::Tree;
use futures::stream::BoxStream;

use crate::document::RemoteDocument;
use crate::error::StoreResult;

/// Change feed of a document.
///
/// The first item is the state at subscription time; every later item is
/// the state after a change, including changes made by this process. `None`
/// means the document does not exist. An `Err` item is terminal.
pub type Watch = BoxStream<'static, StoreResult<Option<RemoteDocument>>>;

/// Key-value document backend.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Point read. `Ok(None)` if the document does not exist.
    async fn get(&self) -> StoreResult<Option<RemoteDocument>>;

    /// Partial write of `regions` and `lastUpdated`.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update(&self, regions: &Tree, last_updated: u64) -> StoreResult<()>;

    /// Create or replace the whole document.
    async fn set(&self, document: RemoteDocument) -> StoreResult<()>;

    /// Open a change feed.
    async fn watch(&self) -> StoreResult<Watch>;
}
