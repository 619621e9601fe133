//! Engine error types

use ocm_types::{JobType, RemediationType};
use thiserror::Error;

/// Errors returned while executing a job
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job type not supported: {0}")]
    UnsupportedJobType(JobType),

    #[error("job sub type does not exist: '{0}'")]
    UnsupportedSubType(RemediationType),

    #[error("job {job_id} has no deployed resource")]
    MissingResource { job_id: String },

    #[error("control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),

    #[error("timed out waiting for ManifestWork {namespace}/{name} to report status")]
    ConvergenceTimeout { namespace: String, name: String },
}

/// Errors from the hub
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("{kind} has no name")]
    Unnamed { kind: &'static str },

    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    #[error("invalid owner identity: {0}")]
    InvalidOwnerId(String),

    #[error("client configuration error: {0}")]
    Config(String),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

/// Errors decoding or rendering a manifest
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest has no apiVersion or kind")]
    MissingTypeInfo,

    #[error("job has no namespace")]
    MissingNamespace,

    #[error("unsupported kind {kind} in {api_version}")]
    UnsupportedKind { api_version: String, kind: String },
}

/// Errors parsing a Kubernetes quantity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity: {0}")]
    Invalid(String),

    #[error("quantity out of range: {0}")]
    Overflow(String),
}

/// Errors applying a remediation to a manifest
#[derive(Debug, Error)]
pub enum ScalingError {
    #[error("unsupported subType: {0}")]
    UnsupportedSubType(String),

    #[error("deployment {0} has no containers")]
    NoContainers(String),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

/// Failure reported by a [`crate::JobReporter`]
#[derive(Debug, Error)]
#[error("job manager request failed: {0}")]
pub struct ReportError(pub String);

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
