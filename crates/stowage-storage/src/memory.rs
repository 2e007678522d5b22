//! In-memory object gateway.
//!
//! Backs development and tests where no S3-compatible endpoint is available.
//! Presigned URLs are synthetic `memory:///` capabilities; redeeming them is
//! simulated by calling [`MemoryObjectStore::redeem_put`] / reading objects
//! directly.

use crate::traits::{ObjectGateway, PresignedUrl, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-memory object store keyed by object key.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a client redeeming a presigned PUT: store bytes under the key.
    pub fn redeem_put(&self, key: &str, data: Bytes, content_type: &str) {
        self.objects.write().unwrap().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
    }

    /// Raw object bytes, if present.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .unwrap()
            .get(key)
            .map(|o| o.data.clone())
    }

    /// Stored content type, if present.
    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .unwrap()
            .get(key)
            .map(|o| o.content_type.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }
}

#[async_trait]
impl ObjectGateway for MemoryObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        max_size: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedUrl> {
        let url = format!(
            "memory:///{}?method=PUT&content_type={}&max_size={}&expires_in={}",
            key,
            content_type,
            max_size,
            expires_in.as_secs()
        );
        Ok(PresignedUrl { url, expires_in })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl> {
        if !self.objects.read().unwrap().contains_key(key) {
            // A GET capability for an absent object would dangle; surface it
            // here so tests catch broken key derivation early.
            return Err(StorageError::NotFound(key.to_string()));
        }
        let url = format!(
            "memory:///{}?method=GET&expires_in={}",
            key,
            expires_in.as_secs()
        );
        Ok(PresignedUrl { url, expires_in })
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.redeem_put(key, data, content_type);
        Ok(())
    }

    async fn fetch(&self, key: &str, max_len: u64) -> StorageResult<Bytes> {
        let objects = self.objects.read().unwrap();
        let stored = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        let size = stored.data.len() as u64;
        if size > max_len {
            return Err(StorageError::TooLarge {
                key: key.to_string(),
                size,
                limit: max_len,
            });
        }
        Ok(stored.data.clone())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        // Absent object is not an error.
        self.objects.write().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().unwrap().contains_key(key))
    }
}
