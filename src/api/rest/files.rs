//! File-sharing routes
//!
//! Authenticated CRUD over the shared root: list, upload, create-folder,
//! delete, download, and share-link generation. Every path argument is
//! validated by the store's path guard before any I/O happens.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::error::{extract_identity, AppError};
use crate::api::AppState;
use crate::storage::EntryInfo;

// ============================================================================
// ROUTES
// ============================================================================

pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/api/files/list", get(list_files))
        .route("/api/files/upload", post(upload_file))
        .route("/api/files/create-folder", post(create_folder))
        .route("/api/files/delete", post(delete_entry))
        .route("/api/files/download", get(download_file))
        .route("/api/files/generate-share-link", post(generate_share_link))
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Deserialize)]
struct PathQuery {
    path: Option<String>,
}

/// Upload endpoint - accepts JSON with the original filename and base64 content
#[derive(Deserialize)]
struct UploadRequest {
    filename: String,
    content: String, // base64 encoded
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    filename: String,
}

#[derive(Deserialize)]
struct CreateFolderRequest {
    name: Option<String>,
    path: Option<String>,
}

#[derive(Serialize)]
struct CreateFolderResponse {
    message: String,
    folder: String,
}

#[derive(Deserialize)]
struct DeleteRequest {
    path: String,
}

#[derive(Deserialize)]
struct ShareLinkRequest {
    path: String,
}

#[derive(Serialize)]
struct ShareLinkResponse {
    share_link: String,
    expiration: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    headers: axum::http::HeaderMap,
) -> Result<Json<Vec<EntryInfo>>, AppError> {
    let _identity = extract_identity(&state, &headers)?;
    let entries = state.files.list(query.path.as_deref())?;
    Ok(Json(entries))
}

async fn upload_file(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(req): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let identity = extract_identity(&state, &headers)?;

    use base64::{engine::general_purpose::STANDARD, Engine};
    let content = STANDARD
        .decode(&req.content)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64: {e}")))?;

    let filename = state
        .files
        .upload(identity.user_id, &req.filename, &content)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            filename,
        }),
    ))
}

async fn create_folder(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<CreateFolderResponse>), AppError> {
    let identity = extract_identity(&state, &headers)?;

    let folder = state
        .files
        .create_folder(identity.user_id, req.name.as_deref(), req.path.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateFolderResponse {
            message: "Folder created successfully".to_string(),
            folder,
        }),
    ))
}

async fn delete_entry(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _identity = extract_identity(&state, &headers)?;
    state.files.delete(&req.path).await?;
    Ok(Json(
        serde_json::json!({ "message": "File/folder deleted successfully" }),
    ))
}

async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    headers: axum::http::HeaderMap,
) -> Result<axum::response::Response, AppError> {
    let _identity = extract_identity(&state, &headers)?;

    let path = query
        .path
        .ok_or_else(|| AppError::BadRequest("File path is required".into()))?;
    let file = state.files.download(&path)?;
    attachment_response(file)
}

async fn generate_share_link(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(req): Json<ShareLinkRequest>,
) -> Result<Json<ShareLinkResponse>, AppError> {
    let identity = extract_identity(&state, &headers)?;

    let link = state
        .files
        .generate_share_link(identity.user_id, &req.path)
        .await?;

    Ok(Json(ShareLinkResponse {
        share_link: link.token,
        expiration: link.expires_at.to_rfc3339(),
    }))
}

/// Build an attachment response with a header-safe filename.
pub(super) fn attachment_response(
    file: crate::storage::DownloadedFile,
) -> Result<axum::response::Response, AppError> {
    let safe_filename: String = file
        .filename
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let safe_filename = if safe_filename.is_empty() {
        "download".to_string()
    } else {
        safe_filename
    };

    let response = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &file.content_type[..])
        .header(header::CONTENT_LENGTH, file.content.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", safe_filename),
        )
        .body(Body::from(file.content))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
