//! In-memory blob store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

use crate::blob::{BlobError, BlobReader, BlobStore};

/// Blob store that keeps objects in memory.
///
/// Enforces the same size check as the file system store and can be told to
/// fail the next upload.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
    buckets: Arc<RwLock<Vec<String>>>,
    next_error: Arc<RwLock<Option<BlobError>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `put` fail with `error`.
    pub async fn set_next_error(&self, error: BlobError) {
        *self.next_error.write().await = Some(error);
    }

    /// Keys stored in `bucket`, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Buckets created through `ensure_bucket`.
    pub async fn buckets(&self) -> Vec<String> {
        self.buckets.read().await.clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobError> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|b| b == bucket) {
            buckets.push(bucket.to_string());
        }
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        mut reader: BlobReader,
        size: u64,
    ) -> Result<(), BlobError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        if data.len() as u64 != size {
            return Err(BlobError::SizeMismatch {
                key: key.to_string(),
                expected: size,
                actual: data.len() as u64,
            });
        }

        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobError> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BlobError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
