use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{AppState, HealthLiveResponse, HealthReadinessChecks, HealthReadyResponse};

/// `GET /api/health/live`
///
/// Liveness probe: the process is up and serving.
pub async fn health_live(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthLiveResponse {
        status: "alive",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// `GET /api/health/ready`
///
/// Readiness probe that pings the user store.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            false
        }
    };

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthReadyResponse {
            ready: db_ready,
            checks: HealthReadinessChecks { database: db_ready },
        }),
    )
        .into_response()
}
