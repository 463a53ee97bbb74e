//! Detection job API handlers.

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection},
        Multipart, Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;
use vidscan_core::{DetectionResult, ModelType, SubmitRequest};

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a stream
#[derive(Debug, Deserialize)]
pub struct StreamBody {
    /// RTSP URI of the stream
    pub source: String,
    /// Model selector ("RGB" or "BYTES", any case)
    pub model: String,
}

/// Response for a single submitted job
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Response for an archive submission
#[derive(Debug, Serialize)]
pub struct IdsResponse {
    pub ids: Vec<i64>,
}

/// Parsed multipart upload: a `source` file and a `model` field.
struct UploadForm {
    filename: String,
    data: Bytes,
    model: ModelType,
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(err.status(), err.body_text())
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut model: Option<ModelType> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "source" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            "model" => {
                let text = field.text().await.map_err(multipart_error)?;
                model = Some(text.trim().parse()?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (filename, data) = file.ok_or_else(|| ApiError::unprocessable("missing field: source"))?;
    if data.is_empty() {
        return Err(ApiError::unprocessable("source is empty"));
    }
    let model = model.ok_or_else(|| ApiError::unprocessable("missing field: model"))?;

    Ok(UploadForm {
        filename,
        data,
        model,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit an uploaded video for detection
pub async fn submit_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;
    let size = form.data.len() as u64;

    let request = SubmitRequest::video(
        form.filename,
        size,
        Box::new(Cursor::new(form.data)),
        form.model,
    );
    let id = state.orchestrator().submit(request).await?;

    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

/// Submit an RTSP stream for detection
pub async fn submit_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StreamBody>, JsonRejection>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::unprocessable(e.body_text()))?;

    if body.source.trim().is_empty() {
        return Err(ApiError::unprocessable("source is required"));
    }
    let model: ModelType = body.model.trim().parse()?;

    let id = state
        .orchestrator()
        .submit(SubmitRequest::stream(body.source, model))
        .await?;

    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

/// Submit every video in a zip archive for detection
pub async fn submit_archive(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IdsResponse>), ApiError> {
    let form = read_upload_form(multipart).await?;
    debug!("Received archive {} ({} bytes)", form.filename, form.data.len());

    let ids = state
        .orchestrator()
        .submit_archive(form.data.to_vec(), form.model)
        .await?;

    Ok((StatusCode::CREATED, Json(IdsResponse { ids })))
}

/// Cancel an in-flight job
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    state.orchestrator().cancel(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the current status and anomalies of a job
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DetectionResult>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let result = state.results().find(id).await?;
    Ok(Json(result))
}
