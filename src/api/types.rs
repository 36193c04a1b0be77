use serde::{Deserialize, Serialize};

use crate::models::Device;

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub device_id: Option<String>,
    pub device_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub username: String,
    pub devices: Vec<Device>,
}

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}
