use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MalformedRequest(String),

    #[error(
        "File too large. Maximum allowed size is {max_bytes} bytes ({}MB).",
        .max_bytes / 1024 / 1024
    )]
    PayloadTooLarge { max_bytes: u64 },

    #[error("Failed to prepare upload directory: {0}")]
    StorageUnavailable(#[source] std::io::Error),

    #[error("Failed to save uploaded file: {0}")]
    StorageFailure(#[source] std::io::Error),
}

/// Carried inside an `io::Error` when the request body limit cut a file stream short.
#[derive(Error, Debug)]
#[error("request body exceeded the configured limit")]
pub struct BodyLimitExceeded;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageUnavailable(_) | AppError::StorageFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Upload failed: {:?}", self);
        }

        let body = Json(ErrorResponse {
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}
