//! Defines routes for the file transfer and health endpoints.
//!
//! ## Structure
//! - `POST /upload`    — store a base64/data-URL payload, returns a code
//! - `GET  /download`  — fetch a payload by `?code=`, one-shot
//! - `GET  /healthz`   — liveness
//! - `GET  /readyz`    — readiness (Redis connectivity)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        transfer_handlers::{download_file, upload_file},
    },
    services::file_store::FileStore,
};
use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};

/// Shared state carried by the router to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: FileStore,
    /// Base URL advertised in download links.
    pub public_url: String,
}

impl FromRef<AppState> for FileStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for String {
    fn from_ref(state: &AppState) -> Self {
        state.public_url.clone()
    }
}

/// Build and return the router for all endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // transfer endpoints
        .route("/upload", post(upload_file))
        .route("/download", get(download_file))
}
