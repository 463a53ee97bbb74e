//! Read side of a detection job: stored status joined with live anomalies.

use std::sync::Arc;

use tracing::warn;

use crate::detection::DetectionResult;
use crate::inference::InferenceClient;
use crate::orchestrator::OrchestratorError;
use crate::status::{StatusStore, StoreError};

/// Joins a job's stored type and status with the anomalies the inference
/// service currently reports for it.
pub struct ResultReader {
    store: Arc<dyn StatusStore>,
    inference: Arc<dyn InferenceClient>,
}

impl ResultReader {
    pub fn new(store: Arc<dyn StatusStore>, inference: Arc<dyn InferenceClient>) -> Self {
        Self { store, inference }
    }

    /// Load the result for `query_id`.
    ///
    /// The inference service is only asked once the job is known to exist.
    pub async fn find(&self, query_id: i64) -> Result<DetectionResult, OrchestratorError> {
        let record = self
            .store
            .find_response_by_query_id(query_id)
            .map_err(|e| match e {
                StoreError::NotFound(id) => OrchestratorError::RecordNotFound(id),
                other => OrchestratorError::RecordReadFailed(other),
            })?;

        let anomalies = self.inference.find_result(query_id).await.map_err(|e| {
            warn!(job_id = query_id, "Failed to fetch anomalies: {}", e);
            OrchestratorError::ResultFetchFailed(e)
        })?;

        Ok(DetectionResult {
            query_type: record.query_type,
            status: record.status,
            anomalies,
        })
    }
}
