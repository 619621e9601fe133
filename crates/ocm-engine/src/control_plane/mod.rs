//! Control plane access
//!
//! The [`ControlPlane`] trait is the only path from the engine to the hub.
//! [`KubeControlPlane`] talks to a real hub; [`InMemoryControlPlane`] keeps
//! everything in process for tests and local development.

mod kube;
mod memory;

pub use self::kube::KubeControlPlane;
pub use self::memory::InMemoryControlPlane;

use crate::crd::{ClusterManager, ManagedCluster, ManifestWork, CLUSTER_MANAGER_NAME};
use crate::error::ControlPlaneError;
use async_trait::async_trait;
use uuid::Uuid;

/// Result type for control plane operations
pub type Result<T> = std::result::Result<T, ControlPlaneError>;

/// CRUD over work bundles plus the listings the engine needs
///
/// `cluster` is always the managed cluster name, which is also the namespace
/// the hub keeps that cluster's ManifestWorks in.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Create a work bundle; the hub assigns its name suffix and UID
    async fn create_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork>;

    /// Fetch a work bundle, `None` if it does not exist
    async fn get_work(&self, cluster: &str, name: &str) -> Result<Option<ManifestWork>>;

    /// Replace a work bundle's spec
    async fn update_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork>;

    async fn delete_work(&self, cluster: &str, name: &str) -> Result<()>;

    async fn list_works(&self, cluster: &str) -> Result<Vec<ManifestWork>>;

    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>>;

    async fn get_cluster_manager(&self, name: &str) -> Result<ClusterManager>;
}

/// Identity this orchestrator uses with the job manager: the UID of the
/// hub's `cluster-manager`, validated as a UUID.
pub async fn owner_id(plane: &dyn ControlPlane) -> Result<Uuid> {
    let manager = plane.get_cluster_manager(CLUSTER_MANAGER_NAME).await?;
    let uid = manager.metadata.uid.unwrap_or_default();
    Uuid::parse_str(&uid).map_err(|_| ControlPlaneError::InvalidOwnerId(uid))
}
