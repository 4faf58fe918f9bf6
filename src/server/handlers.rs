//! HTTP request handlers for the import API.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::importer::ImportError;

use super::AppState;

/// Header carrying the shared import token.
pub const IMPORT_TOKEN_HEADER: &str = "x-import-token";

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Body for `POST /api/imports`.
#[derive(Debug, Deserialize)]
pub struct StartImportRequest {
    /// Path to the already-persisted roster file.
    pub file_path: String,
    /// Display name; defaults to the path's file name.
    pub file_name: Option<String>,
}

/// Body for `POST /api/imports/:id/batches`.
#[derive(Debug, Deserialize)]
pub struct ProcessBatchRequest {
    /// Row offset to read from, normally the last response's `processed`.
    #[serde(default)]
    pub offset: i32,
}

/// Parameters for the job history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn import_error_response(err: ImportError) -> Response {
    let status = match &err {
        ImportError::PermissionDenied => StatusCode::FORBIDDEN,
        ImportError::UnsupportedFormat(_)
        | ImportError::UploadFailed(_)
        | ImportError::InvalidId => StatusCode::BAD_REQUEST,
        ImportError::JobNotFound(_) => StatusCode::NOT_FOUND,
        ImportError::UnreadableFile(_) | ImportError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, &err.to_string())
}

/// Verify the shared token before anything else touches the request.
/// With no token configured the check is disabled.
fn check_token(state: &AppState, headers: &HeaderMap) -> Result<(), ImportError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(IMPORT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ImportError::PermissionDenied)
    }
}

/// Job ids arrive as path strings; anything that is not a positive
/// integer is rejected before hitting the store.
fn parse_import_id(raw: &str) -> Result<i32, ImportError> {
    raw.parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(ImportError::InvalidId)
}

/// `POST /api/imports` - register a job for a roster file.
pub async fn start_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartImportRequest>,
) -> Response {
    if let Err(err) = check_token(&state, &headers) {
        return import_error_response(err);
    }

    // Relative paths refer to files dropped in the uploads directory
    let path = std::path::Path::new(&req.file_path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        state.uploads_dir.join(path)
    };

    match state
        .engine
        .start_import_as(&path, req.file_name.as_deref(), None)
        .await
    {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => import_error_response(err),
    }
}

/// `POST /api/imports/:id/batches` - consume one batch of rows.
pub async fn process_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ProcessBatchRequest>,
) -> Response {
    if let Err(err) = check_token(&state, &headers) {
        return import_error_response(err);
    }

    let id = match parse_import_id(&id) {
        Ok(id) => id,
        Err(err) => return import_error_response(err),
    };

    match state.engine.process_batch(id, req.offset).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => import_error_response(err),
    }
}

/// `GET /api/imports/:id/progress` - read-only progress snapshot.
pub async fn import_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(err) = check_token(&state, &headers) {
        return import_error_response(err);
    }

    let id = match parse_import_id(&id) {
        Ok(id) => id,
        Err(err) => return import_error_response(err),
    };

    match state.engine.progress(id).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => import_error_response(err),
    }
}

/// `GET /api/imports` - past jobs, newest first.
pub async fn import_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Response {
    if let Err(err) = check_token(&state, &headers) {
        return import_error_response(err);
    }

    let limit = params.limit.unwrap_or(20).min(100);
    match state.engine.history(limit as i64).await {
        Ok(jobs) => {
            let rows: Vec<_> = jobs
                .into_iter()
                .map(|job| {
                    serde_json::json!({
                        "id": job.id,
                        "file_name": job.file_name,
                        "format": job.format.as_str(),
                        "total_rows": job.total_rows,
                        "processed_rows": job.processed_rows,
                        "skipped_rows": job.skipped_rows,
                        "percentage": job.percentage(),
                        "status": job.status.as_str(),
                        "created_at": job.created_at.to_rfc3339(),
                    })
                })
                .collect();
            Json(rows).into_response()
        }
        Err(err) => import_error_response(err),
    }
}
