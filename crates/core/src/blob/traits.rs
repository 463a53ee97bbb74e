//! Trait definitions for the blob module.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::BlobError;

/// Byte stream handed to [`BlobStore::put`].
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Object storage for uploaded media, addressed by bucket and key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobError>;

    /// Store `size` bytes read from `reader` under `bucket/key`.
    ///
    /// The object only becomes visible once the whole stream has been
    /// written and its length matches `size`.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        reader: BlobReader,
        size: u64,
    ) -> Result<(), BlobError>;

    /// Read a whole object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobError>;
}
