//! Health and status handlers

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Service banner
pub async fn home() -> Json<&'static str> {
    Json("Welcome to the OCM deploy manager")
}

/// Liveness check
pub async fn healthz() -> Json<&'static str> {
    Json("OCM Driver working properly!")
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub job_manager: String,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> Json<DaemonStatusResponse> {
    Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        job_manager: state.job_manager.base_url().to_string(),
    })
}
