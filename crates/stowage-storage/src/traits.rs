//! Object-store gateway trait
//!
//! All backends (S3-compatible, in-memory) implement `ObjectGateway`.
//! Orchestrators hold it as `Arc<dyn ObjectGateway>` and never touch a
//! backend type directly.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object {key} is {size} bytes, exceeding the {limit} byte read limit")]
    TooLarge { key: String, size: u64, limit: u64 },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A minted capability URL together with its validity window.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_in: Duration,
}

/// Object-store gateway.
///
/// The gateway issues capabilities and performs narrow direct operations; it
/// holds no state of its own. Size and expiry constraints on presigned URLs
/// are enforced by the object store when the client redeems them, not
/// re-validated here.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Mint a presigned PUT URL for a direct client upload.
    ///
    /// `content_type` and `max_size` describe what the client declared; the
    /// object store rejects uploads exceeding them when it can enforce that.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        max_size: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl>;

    /// Mint a presigned GET URL for a direct client download.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl>;

    /// Store an object directly. Used only for server-derived content
    /// (thumbnails); original file bytes never pass through this service.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Read an object directly, bounded by `max_len` to keep memory use
    /// bounded. Used only by thumbnail derivation.
    async fn fetch(&self, key: &str, max_len: u64) -> StorageResult<Bytes>;

    /// Delete an object. Idempotent: deleting an absent object succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
