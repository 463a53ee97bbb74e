//! Error responses shared by every handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use vidscan_core::{OrchestratorError, ParseError};

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub msg: String,
}

/// An error that renders as `{"msg": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        let status = match &err {
            OrchestratorError::NotProcessing(_)
            | OrchestratorError::InvalidStreamSource(_)
            | OrchestratorError::InvalidArchive(_) => StatusCode::BAD_REQUEST,
            OrchestratorError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::BlobUploadFailed(_)
            | OrchestratorError::RecordInsertFailed(_)
            | OrchestratorError::RecordUpdateFailed(_)
            | OrchestratorError::RecordReadFailed(_)
            | OrchestratorError::ResultFetchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status, self.msg);
        } else {
            warn!("{} {}", self.status, self.msg);
        }
        (self.status, Json(ErrorResponse { msg: self.msg })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidscan_core::StoreError;

    #[test]
    fn test_orchestrator_error_status() {
        assert_eq!(
            ApiError::from(OrchestratorError::NotProcessing(1)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(OrchestratorError::RecordNotFound(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrchestratorError::RecordInsertFailed(StoreError::Database(
                "locked".to_string()
            )))
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_processing_message_preserved() {
        let err = ApiError::from(OrchestratorError::NotProcessing(5));
        assert_eq!(err.msg, "query with this id is not being processed");
    }
}
