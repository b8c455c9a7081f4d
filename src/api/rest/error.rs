//! Error handling for the REST API
//!
//! Maps the storage failure taxonomy onto transport statuses and extracts the
//! verified caller identity used by every authenticated route.

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::api::AppState;
use crate::auth::{self, Identity};
use crate::storage::ShareError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Gone(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::Internal(msg) => {
                // Log full details server-side, return a generic message to
                // the client.
                tracing::error!(details = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<ShareError> for AppError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::PathEscape => AppError::Forbidden("Invalid path".into()),
            ShareError::NotFound(what) => AppError::NotFound(format!("Not found: {what}")),
            ShareError::NoFile => AppError::BadRequest("No file provided".into()),
            ShareError::MissingName => AppError::BadRequest("Folder name is required".into()),
            ShareError::LinkNotFound => AppError::NotFound("Share link not found".into()),
            ShareError::LinkExpired => AppError::Gone("This share link has expired".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Extract the verified caller identity from the Authorization header.
pub fn extract_identity(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<Identity, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".into()))?;

    let identity = auth::verify_token(&state.config.jwt_secret, token)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;
    tracing::debug!(user = %identity.username, role = %identity.role, "authenticated request");
    Ok(identity)
}
