//! Mapping of pipeline errors onto HTTP responses

use crate::error::{ErrorKind, StyleTextError};
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error returned by the HTTP handlers
#[derive(Debug)]
pub struct ApiError {
    error: StyleTextError,
    status: StatusCode,
}

impl ApiError {
    /// Status code for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// 400 for bad input, 503 while the model is unavailable, 500 otherwise
#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Decode | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Synthesis
        | ErrorKind::Encode
        | ErrorKind::Persistence
        | ErrorKind::InvalidConfig
        | ErrorKind::Io
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StyleTextError> for ApiError {
    fn from(error: StyleTextError) -> Self {
        let status = status_for(error.kind());
        Self { error, status }
    }
}

/// Oversized uploads keep axum's 413; any other form problem is a 400
impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        let status = match error.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            error: StyleTextError::invalid_request(format!(
                "malformed multipart form: {}",
                error.body_text()
            )),
            status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.error {
            StyleTextError::Decode(_) => "Could not decode image.".to_string(),
            StyleTextError::ModelUnavailable(_) => "Model is not available.".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
