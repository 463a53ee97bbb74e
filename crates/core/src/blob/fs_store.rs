//! File system blob store implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::debug;

use super::error::BlobError;
use super::traits::{BlobReader, BlobStore};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Stores each bucket as a directory under a root path.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, BlobError> {
        validate_name(bucket)?;
        validate_name(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

/// Reject names that could escape their bucket directory.
fn validate_name(name: &str) -> Result<(), BlobError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(BlobError::InvalidKey(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BlobError> {
        validate_name(bucket)?;
        fs::create_dir_all(self.root.join(bucket)).await?;
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        mut reader: BlobReader,
        size: u64,
    ) -> Result<(), BlobError> {
        let destination = self.object_path(bucket, key)?;
        self.ensure_bucket(bucket).await?;

        let partial = self
            .root
            .join(bucket)
            .join(format!(".{}.{}.part", key, uuid::Uuid::new_v4()));

        let mut writer = BufWriter::new(File::create(&partial).await?);
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;

        let copied: Result<(), std::io::Error> = async {
            loop {
                let n = reader.read(&mut buffer).await?;
                if n == 0 {
                    break;
                }
                writer.write_all(&buffer[..n]).await?;
                written += n as u64;
            }
            writer.flush().await
        }
        .await;

        if let Err(e) = copied {
            let _ = fs::remove_file(&partial).await;
            return Err(BlobError::Io(e));
        }

        if written != size {
            let _ = fs::remove_file(&partial).await;
            return Err(BlobError::SizeMismatch {
                key: key.to_string(),
                expected: size,
                actual: written,
            });
        }

        if let Err(e) = fs::rename(&partial, &destination).await {
            let _ = fs::remove_file(&partial).await;
            return Err(BlobError::Io(e));
        }

        debug!("Stored {} bytes at {}/{}", written, bucket, key);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BlobError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}
