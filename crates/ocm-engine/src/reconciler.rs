//! Fleet reconciliation
//!
//! Scans every managed cluster for the bundles it hosts and reports what the
//! hub currently knows about each, with no job correlation. The job manager
//! matches resources back to jobs by UUID.

use crate::control_plane::ControlPlane;
use crate::crd::ManifestWork;
use crate::error::Result;
use ocm_types::Resource;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Enumerates deployed bundles across the fleet
#[derive(Clone)]
pub struct FleetReconciler {
    plane: Arc<dyn ControlPlane>,
}

impl FleetReconciler {
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self { plane }
    }

    /// Observed resources of every bundle on every managed cluster
    ///
    /// A cluster that cannot be listed is logged and skipped. Failing to list
    /// the clusters themselves is an error.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<Vec<Resource>> {
        let clusters = self.plane.list_managed_clusters().await?;
        let mut resources = Vec::new();

        for cluster in &clusters {
            let Some(name) = cluster.metadata.name.as_deref() else {
                continue;
            };

            let works = match self.plane.list_works(name).await {
                Ok(works) => works,
                Err(e) => {
                    warn!(cluster = name, error = %e, "Error listing ManifestWorks, skipping cluster");
                    continue;
                }
            };

            if works.is_empty() {
                info!(cluster = name, "No ManifestWorks found on cluster");
                continue;
            }

            resources.extend(works.iter().map(observe));
        }

        info!(clusters = clusters.len(), resources = resources.len(), "Fleet sync complete");
        Ok(resources)
    }
}

/// Resource view of one bundle
pub fn observe(work: &ManifestWork) -> Resource {
    Resource::observed(work.uid(), work.name(), work.conditions().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::InMemoryControlPlane;
    use crate::crd::ManifestWorkSpec;
    use crate::error::{ControlPlaneError, EngineError};
    use ocm_types::Condition;

    async fn deploy(plane: &InMemoryControlPlane, cluster: &str, prefix: &str) -> ManifestWork {
        let mut work = ManifestWork::new("", ManifestWorkSpec::default());
        work.metadata.name = None;
        work.metadata.generate_name = Some(prefix.to_string());
        plane.create_work(cluster, &work).await.unwrap()
    }

    #[tokio::test]
    async fn test_sync_all_collects_every_cluster() {
        let plane = Arc::new(
            InMemoryControlPlane::new()
                .with_initial_conditions(vec![Condition::new("Available", "True")]),
        );
        plane.add_cluster("cluster1");
        plane.add_cluster("cluster2");
        plane.add_cluster("empty");
        let a = deploy(&plane, "cluster1", "web-").await;
        let b = deploy(&plane, "cluster2", "db-").await;

        let mut resources = FleetReconciler::new(plane).sync_all().await.unwrap();
        resources.sort_by(|x, y| x.resource_name.cmp(&y.resource_name));

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].resource_name, b.name());
        assert_eq!(resources[0].resource_uuid, b.uid());
        assert_eq!(resources[1].resource_name, a.name());
        assert_eq!(resources[1].conditions[0].type_, "Available");
        assert!(resources.iter().all(|r| r.job_id.is_empty()));
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_skipped() {
        let plane = Arc::new(InMemoryControlPlane::new());
        plane.add_cluster("cluster1");
        plane.add_cluster("cluster2");
        deploy(&plane, "cluster1", "web-").await;
        deploy(&plane, "cluster2", "db-").await;
        plane.fail_cluster("cluster1");

        let resources = FleetReconciler::new(plane).sync_all().await.unwrap();

        assert_eq!(resources.len(), 1);
        assert!(resources[0].resource_name.starts_with("db-"));
    }

    #[tokio::test]
    async fn test_cluster_listing_failure_is_error() {
        let plane = Arc::new(InMemoryControlPlane::new());
        plane.fail_cluster_listing();

        let err = FleetReconciler::new(plane).sync_all().await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::ControlPlane(ControlPlaneError::Unavailable(_))
        ));
    }
}
