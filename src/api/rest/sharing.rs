//! Public share-link resolution
//!
//! Token-based access; no caller identity. Expiry is checked by the link
//! registry at resolution time, and the stored target is re-validated against
//! the shared root before anything is read.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::error::AppError;
use super::files::attachment_response;
use crate::api::AppState;

// ============================================================================
// ROUTES
// ============================================================================

pub fn sharing_routes() -> Router<AppState> {
    Router::new()
        .route("/share/:token", get(shared_file_info))
        .route("/share/:token/download", get(download_shared_file))
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Serialize)]
struct SharedFileInfo {
    name: String,
    size: u64,
    is_directory: bool,
    expires_at: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn shared_file_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SharedFileInfo>, AppError> {
    let link = state.files.links().resolve(&token).await?;
    let target = state.files.guard().resolve(Some(&link.path))?;
    let meta = std::fs::metadata(&target)
        .map_err(|_| AppError::NotFound("Shared file not found".into()))?;

    Ok(Json(SharedFileInfo {
        name: link.name,
        size: if meta.is_dir() { 0 } else { meta.len() },
        is_directory: meta.is_dir(),
        expires_at: link.expires_at.to_rfc3339(),
    }))
}

async fn download_shared_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let link = state.files.links().resolve(&token).await?;
    let target = state.files.guard().resolve(Some(&link.path))?;
    if target.is_dir() {
        return Err(AppError::BadRequest("This share is not a file".into()));
    }

    let file = state.files.download(&link.path)?;
    attachment_response(file)
}
