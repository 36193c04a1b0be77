use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::{ApiError, AppState, DevicesResponse, LoginRequest, LoginResponse};
use crate::services::LoginAttempt;

/// POST /api/login
/// Records a login for `username` from `device_id`, generating the id when absent.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;

    tracing::debug!(
        username = ?payload.username,
        device_id = ?payload.device_id,
        "Login request"
    );

    let receipt = state
        .registry()
        .record_login(LoginAttempt {
            username: payload.username,
            device_id: payload.device_id,
            device_type: payload.device_type,
        })
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        device_id: receipt.device_id,
    }))
}

/// GET /api/devices/{username}
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DevicesResponse>, ApiError> {
    let devices = state.registry().list_devices(&username).await?;

    Ok(Json(DevicesResponse { username, devices }))
}
