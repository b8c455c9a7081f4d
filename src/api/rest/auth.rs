//! Authentication routes
//!
//! Users are provisioned via the CLI; this only exchanges credentials for an
//! access token.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::api::AppState;
use crate::auth;
use crate::db::users;

// ============================================================================
// ROUTES
// ============================================================================

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
    user_id: String,
    /// Token expiration time in seconds (24 hours)
    expires_in: i64,
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = users::get_user_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| {
            tracing::warn!(username = %req.username, "login for unknown user");
            AppError::Unauthorized("Invalid credentials".into())
        })?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(username = %req.username, "login with wrong password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = auth::create_access_token(&state.config.jwt_secret, &user)?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id.to_string(),
        expires_in: 24 * 60 * 60,
    }))
}
