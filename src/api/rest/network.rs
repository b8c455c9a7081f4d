//! Network status routes
//!
//! Status is assembled from independent telemetry probes; the device list is
//! the reconciliation of a live neighbor-table scan against the known-device
//! identity table. A failed scan degrades to an empty list, never an error.

use axum::{extract::State, routing::get, Json, Router};

use super::error::{extract_identity, AppError};
use crate::api::AppState;
use crate::db::devices;
use crate::network::{self, DiscoveredDevice, NetworkStatus};

// ============================================================================
// ROUTES
// ============================================================================

pub fn network_routes() -> Router<AppState> {
    Router::new()
        .route("/api/network", get(network_status))
        .route("/api/network/devices", get(list_devices))
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn network_status(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<NetworkStatus>, AppError> {
    let _identity = extract_identity(&state, &headers)?;
    Ok(Json(network::collect().await))
}

async fn list_devices(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<Vec<DiscoveredDevice>>, AppError> {
    let _identity = extract_identity(&state, &headers)?;

    let raw = match network::read_neighbor_table().await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("network scan failed: {e}");
            String::new()
        }
    };
    let known = devices::list_known_devices(&state.db).await?;

    Ok(Json(network::reconcile(&raw, &known)))
}
