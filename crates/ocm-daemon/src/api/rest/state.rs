//! Application state for API handlers

use crate::job_manager::JobManagerClient;
use ocm_engine::{ControlPlane, ConvergenceConfig, FleetReconciler, JobExecutor};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Hub access
    pub plane: Arc<dyn ControlPlane>,

    /// Job dispatch
    pub executor: Arc<JobExecutor>,

    /// Fleet sync-up
    pub reconciler: Arc<FleetReconciler>,

    /// Job manager client
    pub job_manager: Arc<JobManagerClient>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        plane: Arc<dyn ControlPlane>,
        job_manager: JobManagerClient,
        convergence: ConvergenceConfig,
    ) -> Self {
        Self {
            executor: Arc::new(JobExecutor::new(plane.clone(), convergence)),
            reconciler: Arc::new(FleetReconciler::new(plane.clone())),
            plane,
            job_manager: Arc::new(job_manager),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
