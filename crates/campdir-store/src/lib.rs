//! Persistence for campdir.
//!
//! Three layers, leaf to root:
//!
//! - [`DocumentService`]: a key-value document backend holding one
//!   [`RemoteDocument`]. [`MemoryDocumentService`] for tests and offline use,
//!   [`FsDocumentService`] for a shared JSON file.
//! - [`RemoteAdapter`]: the document as seen by the sync core. Timeouts,
//!   read caching, seed fallback and subscriptions live here; remote
//!   failures stop at this boundary.
//! - [`LocalCache`]: a synchronous local copy for instant startup.
//!
//! [`SeedSource`] supplies the initial directory when the remote document
//! does not exist or cannot be reached.

pub mod adapter;
pub mod backends;
pub mod document;
pub mod error;
pub mod local_cache;
pub mod seed;
pub mod service;

pub use adapter::{DEFAULT_CACHE_TTL, DEFAULT_READ_TIMEOUT, RemoteAdapter, Subscription, SubscriptionEvent};
pub use backends::{Fault, Faults, FsDocumentService, MemoryDocumentService, WRITE_LOG_CAPACITY};
pub use document::{DOCUMENT_VERSION, RemoteDocument};
pub use error::{CacheError, SeedError, StoreError, StoreResult};
pub use local_cache::{FileCache, LocalCache, MemoryCache};
pub use seed::SeedSource;
pub use service::{DocumentService, Watch};
