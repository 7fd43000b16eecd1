//! Byte storage for uploaded content, addressed by an opaque key.
//!
//! The hierarchy never looks inside a key; it only stores what `put` returned.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod local;
pub mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type BlobResult<T> = std::result::Result<T, BlobError>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `key` and returns the key to persist.
    async fn put(&self, key: &str, data: Bytes) -> BlobResult<String>;
    async fn get(&self, key: &str) -> BlobResult<Bytes>;
    /// Fails with `BlobError::NotFound` when nothing is stored under `key`.
    async fn delete(&self, key: &str) -> BlobResult<()>;
    async fn exists(&self, key: &str) -> BlobResult<bool>;
}

/// Deletes a blob, treating an already-missing blob as success.
///
/// Returns `true` when bytes were actually removed.
pub async fn delete_if_present(store: &dyn BlobStore, key: &str) -> BlobResult<bool> {
    match store.delete(key).await {
        Ok(()) => Ok(true),
        Err(BlobError::NotFound(_)) => {
            tracing::debug!("Blob {} already gone", key);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
