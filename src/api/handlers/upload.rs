use crate::AppState;
use crate::api::error::{AppError, BodyLimitExceeded, ErrorResponse};
use crate::utils::validation::precheck_content_length;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
};
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

/// Name of the multipart field carrying the file.
const FILE_FIELD: &str = "file";

#[derive(Serialize, ToSchema)]
pub struct UploadSuccessResponse {
    /// Saved filename
    pub filename: String,
    /// Size of the uploaded file in bytes
    pub size_bytes: u64,
    /// Success message
    pub message: String,
}

/// Multipart form accepted by `POST /upload`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The file to upload. Maximum size: 500MB.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload successful", body = UploadSuccessResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse),
        (status = 413, description = "Payload Too Large", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    tag = "Upload"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadSuccessResponse>, AppError> {
    let max_bytes = state.upload_service.max_bytes();
    precheck_content_length(&headers, max_bytes)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let raw_filename = field.file_name().unwrap_or_default().to_string();
        let body = field.map_err(field_read_error);
        let reader = StreamReader::new(body);

        let result = state.upload_service.store(&raw_filename, reader).await?;

        return Ok(Json(UploadSuccessResponse {
            filename: result.filename.into_inner(),
            size_bytes: result.bytes_written,
            message: "Upload successful".to_string(),
        }));
    }

    Err(AppError::MalformedRequest(
        "File field is required.".to_string(),
    ))
}

/// Keeps a body-limit hit recognisable once the field is read through `io`.
fn field_read_error(err: MultipartError) -> std::io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        std::io::Error::other(BodyLimitExceeded)
    } else {
        std::io::Error::other(err)
    }
}

fn multipart_error(err: MultipartError, max_bytes: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { max_bytes }
    } else {
        AppError::MalformedRequest(err.body_text())
    }
}
