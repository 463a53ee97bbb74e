//! Types for the detection job orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blob::{BlobError, BlobReader};
use crate::detection::{ModelType, QueryType};
use crate::inference::InferenceError;
use crate::status::StoreError;

/// Scheme every stream source must use.
pub const STREAM_SCHEME: &str = "rtsp://";

/// Errors that surface to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Uploading the video to the blob store failed. No records were created.
    #[error("failed to upload video: {0}")]
    BlobUploadFailed(BlobError),

    /// Creating the Query or Response row failed.
    #[error("failed to insert record: {0}")]
    RecordInsertFailed(StoreError),

    /// Writing a status change failed.
    #[error("failed to update record: {0}")]
    RecordUpdateFailed(StoreError),

    #[error("record not found for query {0}")]
    RecordNotFound(i64),

    /// The job is unknown or has already finished.
    #[error("query with this id is not being processed")]
    NotProcessing(i64),

    #[error("invalid stream source: {0}")]
    InvalidStreamSource(String),

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Loading anomalies from the inference service failed.
    #[error("failed to fetch result: {0}")]
    ResultFetchFailed(InferenceError),

    /// Reading the Response row failed for a reason other than absence.
    #[error("failed to read record: {0}")]
    RecordReadFailed(StoreError),
}

/// Where the media for a new job comes from.
pub enum JobSource {
    /// A live stream addressed by URI.
    Stream { uri: String },
    /// An uploaded video file.
    Video {
        filename: String,
        size: u64,
        reader: BlobReader,
    },
}

impl JobSource {
    pub fn query_type(&self) -> QueryType {
        match self {
            JobSource::Stream { .. } => QueryType::Stream,
            JobSource::Video { .. } => QueryType::Video,
        }
    }
}

impl fmt::Debug for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobSource::Stream { uri } => f.debug_struct("Stream").field("uri", uri).finish(),
            JobSource::Video { filename, size, .. } => f
                .debug_struct("Video")
                .field("filename", filename)
                .field("size", size)
                .finish_non_exhaustive(),
        }
    }
}

/// Request to submit a new detection job.
#[derive(Debug)]
pub struct SubmitRequest {
    pub model: ModelType,
    pub source: JobSource,
}

impl SubmitRequest {
    pub fn stream(uri: impl Into<String>, model: ModelType) -> Self {
        Self {
            model,
            source: JobSource::Stream { uri: uri.into() },
        }
    }

    pub fn video(
        filename: impl Into<String>,
        size: u64,
        reader: BlobReader,
        model: ModelType,
    ) -> Self {
        Self {
            model,
            source: JobSource::Video {
                filename: filename.into(),
                size,
                reader,
            },
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Number of jobs with a live registry entry.
    pub active_jobs: usize,
}

/// Build the blob key for an uploaded video: a random id, the unix time and
/// the extension of the original filename.
pub fn generate_storage_key(filename: &str) -> String {
    format!(
        "{}{}.{}",
        uuid::Uuid::new_v4(),
        chrono::Utc::now().timestamp(),
        file_extension(filename)
    )
}

/// Text after the last `.`, or the whole name when there is none, reduced to
/// ASCII letters and digits so the key stays a single path segment.
fn file_extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .unwrap_or(filename)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.mp4"), "mp4");
        assert_eq!(file_extension("clip.final.MOV"), "MOV");
        assert_eq!(file_extension("noext"), "noext");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn test_file_extension_strips_separators() {
        assert_eq!(file_extension("clip.mp4/x"), "mp4x");
        assert_eq!(file_extension("clip.m..\\p4"), "p4");
        assert_eq!(file_extension("../../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn test_storage_key_is_single_segment() {
        let key = generate_storage_key("clip.mp4/../x");
        assert!(!key.contains('/'));
        assert!(!key.contains('\\'));
        assert!(key.ends_with(".x"));
    }

    #[test]
    fn test_storage_key_shape() {
        let key = generate_storage_key("a.mp4");
        assert!(key.ends_with(".mp4"));
        // 36-char uuid followed by at least a 10-digit timestamp
        let stem = key.trim_end_matches(".mp4");
        assert!(stem.len() >= 46);
        assert!(stem[36..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_storage_keys_are_unique() {
        assert_ne!(generate_storage_key("a.mp4"), generate_storage_key("a.mp4"));
    }

    #[test]
    fn test_job_source_query_type() {
        let stream = SubmitRequest::stream("rtsp://cam/1", ModelType::Rgb);
        assert_eq!(stream.source.query_type(), QueryType::Stream);

        let video = SubmitRequest::video(
            "a.mp4",
            1,
            Box::new(std::io::Cursor::new(vec![0u8])),
            ModelType::Bytes,
        );
        assert_eq!(video.source.query_type(), QueryType::Video);
        assert!(format!("{:?}", video.source).contains("a.mp4"));
    }

    #[test]
    fn test_not_processing_message() {
        assert_eq!(
            OrchestratorError::NotProcessing(3).to_string(),
            "query with this id is not being processed"
        );
    }
}
