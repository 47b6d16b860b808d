//! HTTP handlers for the upload/download transfer endpoints.
//! Request validation lives here; chunking and lifecycle concerns are
//! delegated to `FileStore`.

use crate::{
    errors::AppError,
    models::file::human_size,
    services::file_store::{FileStore, StoreError},
};
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body of `POST /upload`. Fields arrive optional so that missing or
/// null values produce our JSON error shape instead of an extractor
/// rejection.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Data-URL or raw base64 payload.
    pub file: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub code: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    /// Human-readable approximate size, e.g. `1.5 MB`.
    pub size: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: u64,
}

/// Query params accepted by `GET /download`.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub code: Option<String>,
}

/// `POST /upload` — store a payload and return its short download code.
pub async fn upload_file(
    State(store): State<FileStore>,
    State(public_url): State<String>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let file = req.file.as_deref().filter(|f| !f.is_empty());
    let file_name = req.file_name.as_deref().filter(|n| !n.is_empty());
    let (Some(file), Some(file_name)) = (file, file_name) else {
        return Err(AppError::bad_request(
            "Invalid request: `file` and `fileName` must be non-empty strings",
        ));
    };

    let (code, record) = store.put(file_name, file).await.map_err(|err| match err {
        err @ (StoreError::TooLarge(_) | StoreError::TooLargeEncoded(_)) => {
            AppError::bad_request(err.to_string())
        }
        StoreError::InvalidPayload(_) => {
            AppError::bad_request("Invalid request: `file` is not valid base64 data")
        }
        other => {
            error!("upload failed: {}", other);
            AppError::internal("Failed to upload file")
        }
    })?;

    Ok(Json(UploadResponse {
        download_url: format!("{}/download?code={}", public_url.trim_end_matches('/'), code),
        code,
        size: human_size(record.total_size),
        expires_in: store.ttl_seconds(),
    }))
}

/// `GET /download?code=X` — serve the stored payload as an attachment.
pub async fn download_file(
    State(store): State<FileStore>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("No code provided"))?;

    let (record, bytes) = store.get(code).await.map_err(|err| match err {
        StoreError::NotFound => AppError::not_found("File not found or link expired"),
        other => {
            error!("download of {} failed: {}", code, other);
            AppError::internal("Failed to download file")
        }
    })?;

    let disposition = format!("attachment; filename=\"{}\"", record.file_name);
    let length = bytes.len();

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&length.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    Ok(response)
}
