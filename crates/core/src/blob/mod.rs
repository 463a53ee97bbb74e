//! Blob storage for uploaded media.

mod error;
mod fs_store;
mod traits;

pub use error::BlobError;
pub use fs_store::FsBlobStore;
pub use traits::{BlobReader, BlobStore};

/// Default bucket for uploaded videos.
pub const DEFAULT_VIDEO_BUCKET: &str = "detection-video";
