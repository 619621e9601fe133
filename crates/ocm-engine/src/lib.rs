//! OCM Job Execution Engine
//!
//! Turns jobs pulled from the job manager into `ManifestWork` bundles on an
//! Open Cluster Management hub, and reflects the hub's status back onto them.
//!
//! ## Architectural Boundaries
//!
//! - `ocm-types` owns: the job manager's wire model
//! - `ocm-engine` owns: rendering, scaling arithmetic, dispatch, convergence,
//!   status mapping and fleet sync-up
//! - `ocm-daemon` owns: HTTP surfaces, the job manager client, configuration
//!
//! All hub access goes through the [`ControlPlane`] trait so the engine can be
//! exercised against [`InMemoryControlPlane`] in tests.
//!
//! ## Usage
//!
//! ```no_run
//! use ocm_engine::{ConvergenceConfig, InMemoryControlPlane, JobExecutor};
//! use ocm_types::Job;
//! use std::sync::Arc;
//!
//! # async fn example(mut job: Job) -> Result<(), ocm_engine::EngineError> {
//! let plane = Arc::new(InMemoryControlPlane::new());
//! let executor = JobExecutor::new(plane, ConvergenceConfig::default());
//! executor.execute(&mut job).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod batch;
pub mod control_plane;
pub mod convergence;
pub mod crd;
pub mod error;
pub mod executor;
pub mod quantity;
pub mod reconciler;
pub mod scaling;
pub mod status;
pub mod translator;

// Re-exports
pub use batch::{BatchFailure, BatchReport, JobReporter};
pub use control_plane::{ControlPlane, InMemoryControlPlane, KubeControlPlane};
pub use convergence::{wait_for_convergence, ConvergenceConfig};
pub use crd::{ClusterManager, ManagedCluster, Manifest, ManifestWork, ManifestWorkSpec};
pub use error::{
    ControlPlaneError, EngineError, QuantityError, ReportError, Result, ScalingError,
    TranslateError,
};
pub use executor::JobExecutor;
pub use reconciler::FleetReconciler;
pub use status::{derive_state, reflect};
pub use translator::{Provenance, WorkloadObject};
