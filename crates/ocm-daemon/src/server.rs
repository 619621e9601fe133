//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{ControlPlaneKind, DaemonConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::job_manager::JobManagerClient;
use ocm_engine::{ControlPlane, InMemoryControlPlane, KubeControlPlane};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Deploy-manager server
pub struct Server {
    config: DaemonConfig,
    plane: Arc<dyn ControlPlane>,
    job_manager: JobManagerClient,
}

impl Server {
    /// Create a new server with the given configuration
    ///
    /// Connects to the control plane and builds the job manager client; both
    /// failures are fatal.
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        if config.job_manager.base_url.is_empty() {
            return Err(DaemonError::Config(
                "job manager URL is not set (JOBMANAGER_URL)".to_string(),
            ));
        }

        let plane: Arc<dyn ControlPlane> = match config.control_plane.kind {
            ControlPlaneKind::Kubernetes => Arc::new(
                KubeControlPlane::connect(config.control_plane.kubeconfig.as_deref()).await?,
            ),
            ControlPlaneKind::Memory => {
                tracing::warn!("Using in-memory control plane, nothing will be deployed");
                Arc::new(InMemoryControlPlane::new())
            }
        };

        let job_manager = JobManagerClient::new(
            &config.job_manager.base_url,
            Duration::from_secs(config.job_manager.request_timeout_secs),
        )?;

        Ok(Self {
            config,
            plane,
            job_manager,
        })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        // Create app state
        let state = AppState::new(self.plane, self.job_manager, self.config.engine.convergence());

        // Create router
        let app = create_router(state, self.config.server.enable_cors);

        // Create listener
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Deploy manager listening on {}", addr);
        tracing::info!("Control plane: {:?}", self.config.control_plane.kind);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Deploy manager shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_job_manager_url() {
        let err = Server::new(DaemonConfig::default()).await.err().unwrap();
        assert!(matches!(err, DaemonError::Config(_)));
    }

    #[tokio::test]
    async fn test_memory_control_plane() {
        let mut config = DaemonConfig::default();
        config.job_manager.base_url = "http://jobmanager:8082/".to_string();
        config.control_plane.kind = ControlPlaneKind::Memory;

        let server = Server::new(config).await.unwrap();
        assert_eq!(server.job_manager.base_url(), "http://jobmanager:8082");
    }
}
