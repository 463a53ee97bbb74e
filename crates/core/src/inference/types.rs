//! Types and trait for the remote inference service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::detection::Anomaly;

/// Errors returned by an inference client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The call was aborted through its cancellation token.
    #[error("Inference call canceled")]
    Canceled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Inference service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Failed to decode inference reply: {0}")]
    Decode(String),
}

/// Request body for a processing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub id: i64,
    pub source: String,
}

/// Reply to a processing call.
///
/// `status` is passed through verbatim; mapping it onto a response status
/// is the orchestrator's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReply {
    pub status: String,
}

/// Request body for a result lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRequest {
    pub id: i64,
}

/// Reply to a result lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultReply {
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
}

/// Remote peer that runs anomaly detection for a job.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Run detection for `job_id` on `source` and wait for its terminal status.
    ///
    /// Implementations must return [`InferenceError::Canceled`] promptly once
    /// `cancel` fires.
    async fn process(
        &self,
        cancel: &CancellationToken,
        job_id: i64,
        source: &str,
    ) -> Result<ProcessReply, InferenceError>;

    /// Fetch the anomalies found so far for `job_id`.
    async fn find_result(&self, job_id: i64) -> Result<Vec<Anomaly>, InferenceError>;
}
