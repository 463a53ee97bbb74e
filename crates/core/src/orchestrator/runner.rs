//! Detection job orchestrator implementation.
//!
//! Each submitted job runs as its own detached task:
//! - Submission: upload (VIDEO only), Query row, Response row, dispatch
//! - Task: remote processing call, status write, registry cleanup
//! - Cancel / shutdown: signal the task's cancellation token

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::blob::BlobStore;
use crate::detection::{ModelType, ResponseStatus};
use crate::inference::{InferenceClient, InferenceError};
use crate::metrics;
use crate::status::{CreateQueryRequest, StatusStore};

use super::registry::{JobRegistry, RegistryGuard};
use super::types::{
    generate_storage_key, JobSource, OrchestratorError, OrchestratorStatus, SubmitRequest,
    STREAM_SCHEME,
};

/// Default cap on the decompressed size of an uploaded archive (1 GiB).
const DEFAULT_ARCHIVE_LIMIT: u64 = 1024 * 1024 * 1024;

/// Coordinates job dispatch, cancellation and status persistence.
pub struct DetectionOrchestrator {
    store: Arc<dyn StatusStore>,
    blobs: Arc<dyn BlobStore>,
    inference: Arc<dyn InferenceClient>,
    registry: JobRegistry,
    video_bucket: String,
    archive_limit: u64,
}

impl DetectionOrchestrator {
    /// Create a new orchestrator with an empty registry.
    pub fn new(
        store: Arc<dyn StatusStore>,
        blobs: Arc<dyn BlobStore>,
        inference: Arc<dyn InferenceClient>,
        video_bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            blobs,
            inference,
            registry: JobRegistry::new(),
            video_bucket: video_bucket.into(),
            archive_limit: DEFAULT_ARCHIVE_LIMIT,
        }
    }

    /// Cap the total number of bytes an archive may expand to.
    pub fn with_archive_limit(mut self, bytes: u64) -> Self {
        self.archive_limit = bytes;
        self
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Get current orchestrator status.
    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            active_jobs: self.registry.len(),
        }
    }

    /// Persist a new job and start processing it in the background.
    ///
    /// Returns once the Query and Response rows exist; the remote call keeps
    /// running after this returns.
    pub async fn submit(&self, request: SubmitRequest) -> Result<i64, OrchestratorError> {
        let query_type = request.source.query_type();

        let source = match request.source {
            JobSource::Video {
                filename,
                size,
                reader,
            } => {
                let key = generate_storage_key(&filename);
                if let Err(e) = self.blobs.put(&self.video_bucket, &key, reader, size).await {
                    error!("Failed to upload {} to {}: {}", filename, self.video_bucket, e);
                    metrics::SUBMISSIONS_FAILED
                        .with_label_values(&["blob_upload"])
                        .inc();
                    return Err(OrchestratorError::BlobUploadFailed(e));
                }
                key
            }
            JobSource::Stream { uri } => {
                if !uri.starts_with(STREAM_SCHEME) {
                    metrics::SUBMISSIONS_FAILED
                        .with_label_values(&["invalid_source"])
                        .inc();
                    return Err(OrchestratorError::InvalidStreamSource(uri));
                }
                uri
            }
        };

        let query = self
            .store
            .create_query(CreateQueryRequest {
                query_type,
                source: source.clone(),
                model: request.model,
            })
            .map_err(|e| {
                error!("Failed to insert query: {}", e);
                metrics::SUBMISSIONS_FAILED
                    .with_label_values(&["record_insert"])
                    .inc();
                OrchestratorError::RecordInsertFailed(e)
            })?;

        // The Query row is left behind if this fails.
        self.store.create_response(query.id).map_err(|e| {
            error!(job_id = query.id, "Failed to insert response: {}", e);
            metrics::SUBMISSIONS_FAILED
                .with_label_values(&["record_insert"])
                .inc();
            OrchestratorError::RecordInsertFailed(e)
        })?;

        metrics::JOBS_SUBMITTED
            .with_label_values(&[query_type.as_str()])
            .inc();
        info!(job_id = query.id, "Submitted {} job", query_type);

        self.dispatch(query.id, source);
        Ok(query.id)
    }

    /// Submit every file in a zip archive as its own VIDEO job.
    ///
    /// Stops at the first failing entry; jobs already submitted keep running.
    /// Archives that decompress beyond the configured limit are rejected
    /// before any job is submitted.
    pub async fn submit_archive(
        &self,
        archive: Vec<u8>,
        model: ModelType,
    ) -> Result<Vec<i64>, OrchestratorError> {
        let limit = self.archive_limit;
        let entries = tokio::task::spawn_blocking(move || extract_archive(archive, limit))
            .await
            .map_err(|e| OrchestratorError::InvalidArchive(e.to_string()))??;

        info!("Submitting {} videos from archive", entries.len());

        let mut ids = Vec::with_capacity(entries.len());
        for (filename, data) in entries {
            let size = data.len() as u64;
            let request = SubmitRequest::video(filename, size, Box::new(Cursor::new(data)), model);
            ids.push(self.submit(request).await?);
        }
        Ok(ids)
    }

    /// Cancel an in-flight job and mark it CANCELED.
    ///
    /// The job's own task may still write its final status afterwards; the
    /// later write wins.
    pub fn cancel(&self, job_id: i64) -> Result<(), OrchestratorError> {
        if !self.registry.cancel(job_id) {
            debug!(job_id, "Cancel requested for job that is not processing");
            return Err(OrchestratorError::NotProcessing(job_id));
        }

        metrics::JOBS_CANCELED.inc();
        info!(job_id, "Canceled job");

        self.store
            .update_response_status(job_id, ResponseStatus::Canceled)
            .map_err(|e| {
                error!(job_id, "Failed to mark job canceled: {}", e);
                OrchestratorError::RecordUpdateFailed(e)
            })
    }

    /// Signal cancellation to every in-flight job without waiting for them.
    ///
    /// Returns the number of jobs signalled.
    pub fn shutdown_all(&self) -> usize {
        let job_ids = self.registry.cancel_all();
        info!(
            ?job_ids,
            "Signalled cancellation to {} in-flight jobs",
            job_ids.len()
        );
        job_ids.len()
    }

    fn dispatch(&self, job_id: i64, source: String) {
        let token = CancellationToken::new();
        self.registry.register(job_id, token.clone());
        let guard = RegistryGuard::new(self.registry.clone(), job_id);

        let store = Arc::clone(&self.store);
        let inference = Arc::clone(&self.inference);

        tokio::spawn(async move {
            let _guard = guard;
            run_job(store.as_ref(), inference.as_ref(), &token, job_id, &source).await;
        });
    }
}

/// Body of a job task: call the inference service and persist the outcome.
async fn run_job(
    store: &dyn StatusStore,
    inference: &dyn InferenceClient,
    token: &CancellationToken,
    job_id: i64,
    source: &str,
) {
    debug!(job_id, source, "Job started");
    let started = Instant::now();

    let outcome = inference.process(token, job_id, source).await;

    let status = match outcome {
        Ok(reply) => {
            metrics::INFERENCE_REQUESTS
                .with_label_values(&["process", "success"])
                .inc();
            info!(job_id, "Job finished with remote status {}", reply.status);
            match ResponseStatus::from_remote(&reply.status) {
                Ok(status) => status,
                Err(e) => {
                    warn!(job_id, "{}, leaving job in PROCESSING", e);
                    metrics::JOBS_FINISHED
                        .with_label_values(&["UNRECOGNIZED"])
                        .inc();
                    return;
                }
            }
        }
        Err(InferenceError::Canceled) => {
            metrics::INFERENCE_REQUESTS
                .with_label_values(&["process", "canceled"])
                .inc();
            info!(job_id, "Job canceled while processing");
            ResponseStatus::Canceled
        }
        Err(e) => {
            metrics::INFERENCE_REQUESTS
                .with_label_values(&["process", "error"])
                .inc();
            error!(job_id, "Processing failed: {}", e);
            ResponseStatus::Error
        }
    };

    metrics::JOBS_FINISHED
        .with_label_values(&[status.as_str()])
        .inc();
    metrics::JOB_DURATION
        .with_label_values(&[status.as_str()])
        .observe(started.elapsed().as_secs_f64());

    if let Err(e) = store.update_response_status(job_id, status) {
        metrics::STATUS_WRITE_FAILURES.inc();
        error!(job_id, "Failed to write final status {}: {}", status, e);
    }
}

/// Read every regular file of a zip archive into memory, keyed by base name.
///
/// Sizes declared in the archive headers are not trusted: entries are read
/// through a bounded reader and the archive is rejected once the bytes
/// actually decompressed exceed `limit` in total.
fn extract_archive(
    bytes: Vec<u8>,
    limit: u64,
) -> Result<Vec<(String, Vec<u8>)>, OrchestratorError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(invalid_archive)?;
    let mut entries = Vec::new();
    let mut remaining = limit;

    for index in 0..archive.len() {
        let file = archive.by_index(index).map_err(invalid_archive)?;
        if file.is_dir() {
            continue;
        }

        let name = match Path::new(file.name()).file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let mut data = Vec::new();
        file.take(remaining.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(invalid_archive)?;

        let read = data.len() as u64;
        if read > remaining {
            return Err(OrchestratorError::InvalidArchive(format!(
                "archive expands beyond {} bytes",
                limit
            )));
        }
        remaining -= read;
        entries.push((name, data));
    }

    Ok(entries)
}

fn invalid_archive(e: impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::InvalidArchive(e.to_string())
}
