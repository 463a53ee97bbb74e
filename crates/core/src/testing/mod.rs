//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits,
//! allowing orchestrator and HTTP tests without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidscan_core::testing::{MemoryBlobStore, MockInferenceClient, MockStatusStore};
//!
//! let store = Arc::new(MockStatusStore::new());
//! let blobs = Arc::new(MemoryBlobStore::new());
//! let inference = Arc::new(MockInferenceClient::new());
//!
//! let orchestrator = DetectionOrchestrator::new(store, blobs, inference, "detection-video");
//! ```

mod mock_blob_store;
mod mock_inference;
mod mock_status_store;

pub use mock_blob_store::MemoryBlobStore;
pub use mock_inference::{MockBehavior, MockInferenceClient, RecordedProcessCall};
pub use mock_status_store::{MockStatusStore, StoreOperation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;

    use crate::detection::ModelType;
    use crate::orchestrator::SubmitRequest;

    /// A VIDEO submission with `size` bytes of filler data.
    pub fn video_request(filename: &str, size: usize) -> SubmitRequest {
        SubmitRequest::video(
            filename,
            size as u64,
            Box::new(Cursor::new(vec![0x42u8; size])),
            ModelType::Rgb,
        )
    }

    /// A STREAM submission for `uri`.
    pub fn stream_request(uri: &str) -> SubmitRequest {
        SubmitRequest::stream(uri, ModelType::Bytes)
    }
}
