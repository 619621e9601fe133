//! Error types for the deploy-manager daemon

use crate::job_manager::JobManagerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ocm_engine::{ControlPlaneError, EngineError};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Control plane client error
    #[error("Control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    /// Job manager client error
    #[error("Job manager error: {0}")]
    JobManager(#[from] JobManagerError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Job manager could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Job manager answered with something unusable
    #[error("Upstream error: {message}")]
    Upstream {
        /// Status returned to the caller
        status: StatusCode,
        /// Status the job manager answered with
        upstream: u16,
        message: String,
    },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", None),
            ApiError::Upstream {
                status, upstream, ..
            } => (
                *status,
                "UPSTREAM_ERROR",
                Some(serde_json::json!({ "upstream_status": upstream })),
            ),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JobManagerError> for ApiError {
    fn from(err: JobManagerError) -> Self {
        match err {
            JobManagerError::Unreachable(e) => ApiError::Unavailable(e.to_string()),
            JobManagerError::Client(e) => ApiError::Internal(e.to_string()),
            JobManagerError::Status { status, body } => ApiError::Upstream {
                status: upstream_status(status),
                upstream: status,
                message: body,
            },
            JobManagerError::Decode { status, message } => ApiError::Upstream {
                status: upstream_status(status),
                upstream: status,
                message,
            },
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ControlPlane(ControlPlaneError::NotFound { kind, name }) => {
                ApiError::NotFound(format!("{} {} not found", kind, name))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ControlPlaneError> for ApiError {
    fn from(err: ControlPlaneError) -> Self {
        EngineError::from(err).into()
    }
}

/// Status to report for an unusable job manager answer: its own status when
/// that is an error, otherwise 422
fn upstream_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(status) if status.is_client_error() || status.is_server_error() => status,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
