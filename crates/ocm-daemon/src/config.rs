//! Configuration for the deploy-manager daemon

use ocm_engine::ConvergenceConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Job manager client configuration
    #[serde(default)]
    pub job_manager: JobManagerConfig,

    /// Engine timing
    #[serde(default)]
    pub engine: EngineConfig,

    /// Control plane connection
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Job manager client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobManagerConfig {
    /// Base URL, e.g. `http://jobmanager:8082/`
    #[serde(default)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Engine timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a new ManifestWork may take to report status
    #[serde(default = "default_convergence_timeout")]
    pub convergence_timeout_ms: u64,

    /// Delay between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            convergence_timeout_ms: default_convergence_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl EngineConfig {
    pub fn convergence(&self) -> ConvergenceConfig {
        ConvergenceConfig::from_millis(self.convergence_timeout_ms, self.poll_interval_ms)
    }
}

/// Which control plane backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPlaneKind {
    /// A real OCM hub reached through the Kubernetes API
    #[default]
    Kubernetes,

    /// In-process hub for local development
    Memory,
}

impl std::str::FromStr for ControlPlaneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kubernetes" | "kube" | "k8s" => Ok(ControlPlaneKind::Kubernetes),
            "memory" | "in-memory" => Ok(ControlPlaneKind::Memory),
            other => Err(format!("Unknown control plane: {}", other)),
        }
    }
}

/// Control plane connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlPlaneConfig {
    #[serde(default)]
    pub kind: ControlPlaneKind,

    /// Kubeconfig used when not running inside the hub cluster
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8083))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_convergence_timeout() -> u64 {
    5000
}

fn default_poll_interval() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `DEPLOY_MANAGER_*` environment variables (`__` separates sections,
    /// e.g. `DEPLOY_MANAGER_ENGINE__POLL_INTERVAL_MS`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with DEPLOY_MANAGER_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("DEPLOY_MANAGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
