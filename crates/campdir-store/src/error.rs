//! Store error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure talking to the remote document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The read did not complete within the deadline.
    #[error("remote read timed out after {0:?}")]
    Timeout(Duration),

    /// The document does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store rejected the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other transport or store failure.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn permission_denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Whether a failed partial update should be retried as a full write.
    pub fn wants_full_write(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::PermissionDenied(_))
    }
}

/// Store result type.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure persisting the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cache encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure loading seed data.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("seed is not valid region JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("seed download failed: {0}")]
    Http(#[from] reqwest::Error),
}
