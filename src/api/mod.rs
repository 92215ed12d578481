use std::io::Write;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tempfile::TempPath;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::models::{Issue, ScanRecord, ScanStatus};
use crate::pipeline::{self, Scheduler};
use crate::store::ScanStore;

const ALLOWED_EXTENSIONS: &[&str] = &[".crx", ".xpi", ".zip"];

#[derive(Clone)]
pub struct AppState {
    pub store: ScanStore,
    pub scheduler: Scheduler,
}

pub fn router(state: AppState, max_upload_mb: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/upload", post(upload))
        .route("/api/scan/:scan_id", get(scan_detail))
        .route("/api/scan/:scan_id/progress", get(scan_progress))
        .route("/api/scan/:scan_id/file/*filename", get(scan_file))
        .layer(DefaultBodyLimit::max(max_upload_mb * 1024 * 1024))
        .layer(
            // Wide open on purpose: the service is consumed from arbitrary
            // origins.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "error": error }))).into_response()
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct UploadResponse {
    scan_id: String,
    status: ScanStatus,
    message: String,
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("malformed multipart body: {err}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| ApiError::validation("a filename is required"))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| ApiError::validation(format!("failed to read upload: {err}")))?;
            file = Some((filename, data));
            break;
        }
    }
    let (filename, data) = file.ok_or_else(|| ApiError::validation("missing file field"))?;

    let suffix = archive_suffix(&filename).ok_or_else(|| {
        ApiError::validation("unsupported file type; expected .crx, .xpi or .zip")
    })?;

    let size_bytes = data.len();
    let upload_path = tokio::task::spawn_blocking(move || persist_upload(&data, &suffix))
        .await
        .map_err(|err| ApiError::internal(format!("upload task failed: {err}")))?
        .map_err(|err| ApiError::internal(format!("failed to persist upload: {err}")))?;

    let scan_id = Uuid::new_v4().to_string();
    let record = ScanRecord::new(scan_id.clone(), filename, size_bytes);
    state.store.insert(record).await;
    state
        .scheduler
        .spawn(pipeline::run_scan(
            state.store.clone(),
            scan_id.clone(),
            upload_path,
        ))
        .await;

    tracing::info!(%scan_id, "upload accepted, analysis scheduled");

    Ok(Json(UploadResponse {
        scan_id,
        status: ScanStatus::Uploaded,
        message: "File uploaded; analysis has started".to_string(),
    }))
}

/// Accepted archive suffix (with the dot, lowercased), or None.
fn archive_suffix(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let suffix = format!(".{}", extension.to_lowercase());
    ALLOWED_EXTENSIONS
        .contains(&suffix.as_str())
        .then_some(suffix)
}

fn persist_upload(data: &[u8], suffix: &str) -> std::io::Result<TempPath> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
    file.write_all(data)?;
    Ok(file.into_temp_path())
}

async fn scan_detail(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<Json<ScanRecord>, ApiError> {
    let record = state
        .store
        .get(&scan_id)
        .await
        .ok_or_else(|| ApiError::not_found("scan not found"))?;
    Ok(Json(record))
}

#[derive(Serialize)]
struct ProgressResponse {
    scan_id: String,
    filename: String,
    progress: u8,
    status: ScanStatus,
}

async fn scan_progress(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let record = state
        .store
        .get(&scan_id)
        .await
        .ok_or_else(|| ApiError::not_found("scan not found"))?;
    Ok(Json(ProgressResponse {
        scan_id: record.scan_id,
        filename: record.filename,
        progress: record.progress,
        status: record.status,
    }))
}

#[derive(Serialize)]
struct FileResponse {
    filename: String,
    content: String,
    issues: Vec<Issue>,
    language: &'static str,
}

async fn scan_file(
    State(state): State<AppState>,
    Path((scan_id, filename)): Path<(String, String)>,
) -> Result<Json<FileResponse>, ApiError> {
    let record = state
        .store
        .get(&scan_id)
        .await
        .ok_or_else(|| ApiError::not_found("scan not found"))?;
    let content = record
        .file_contents
        .get(&filename)
        .cloned()
        .ok_or_else(|| ApiError::not_found("file not found in scan"))?;
    let issues = record
        .issues
        .iter()
        .filter(|issue| issue.file == filename)
        .cloned()
        .collect();
    let language = if filename.ends_with(".js") {
        "javascript"
    } else {
        "json"
    };
    Ok(Json(FileResponse {
        filename,
        content,
        issues,
        language,
    }))
}
