use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::ConchitasError;

/// HTTP error with a `{"error": "<message>"}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_for(err: &ConchitasError) -> StatusCode {
    match err {
        ConchitasError::CollectionNotFound(_) | ConchitasError::RecordNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ConchitasError::InvalidRecord(_)
        | ConchitasError::NotACollection(_)
        | ConchitasError::InvalidTransition { .. }
        | ConchitasError::Regex(_) => StatusCode::BAD_REQUEST,
        ConchitasError::DuplicateRecord { .. } => StatusCode::CONFLICT,
        ConchitasError::Locked(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ConchitasError> for ApiError {
    fn from(err: ConchitasError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
