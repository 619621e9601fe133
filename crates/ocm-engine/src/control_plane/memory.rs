//! In-memory control plane
//!
//! Suitable for development and testing. Behaves like the hub where the
//! engine can observe it: names come from `generateName`, UIDs are assigned on
//! create and status survives spec updates.

use super::{ControlPlane, Result};
use crate::crd::{
    ClusterManager, ClusterManagerSpec, ManagedCluster, ManagedClusterSpec, ManifestWork,
    ManifestWorkStatus, CLUSTER_MANAGER_NAME,
};
use crate::error::ControlPlaneError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use ocm_types::Condition;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

const WORK_KIND: &str = "ManifestWork";

/// Work bundles keyed by (cluster, name)
pub struct InMemoryControlPlane {
    works: DashMap<(String, String), ManifestWork>,
    clusters: DashMap<String, ManagedCluster>,
    unavailable: DashSet<String>,
    clusters_unavailable: AtomicBool,
    owner_uid: Option<String>,
    initial_conditions: Vec<Condition>,
    get_calls: AtomicUsize,
}

impl InMemoryControlPlane {
    pub fn new() -> Self {
        Self {
            works: DashMap::new(),
            clusters: DashMap::new(),
            unavailable: DashSet::new(),
            clusters_unavailable: AtomicBool::new(false),
            owner_uid: Some(Uuid::new_v4().to_string()),
            initial_conditions: Vec::new(),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// UID reported for the `cluster-manager` singleton
    pub fn with_owner_uid(mut self, uid: impl Into<String>) -> Self {
        self.owner_uid = Some(uid.into());
        self
    }

    /// Hub without a `cluster-manager`
    pub fn without_cluster_manager(mut self) -> Self {
        self.owner_uid = None;
        self
    }

    /// Conditions attached to every bundle as soon as it is created
    pub fn with_initial_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.initial_conditions = conditions;
        self
    }

    /// Register a managed cluster
    pub fn add_cluster(&self, name: &str) {
        let spec = ManagedClusterSpec {
            hub_accepts_client: true,
            lease_duration_seconds: Some(60),
        };
        self.clusters
            .insert(name.to_string(), ManagedCluster::new(name, spec));
    }

    /// Make every call scoped to `cluster` fail as if the hub were unreachable
    pub fn fail_cluster(&self, cluster: &str) {
        self.unavailable.insert(cluster.to_string());
    }

    /// Make listing managed clusters fail
    pub fn fail_cluster_listing(&self) {
        self.clusters_unavailable.store(true, Ordering::SeqCst);
    }

    /// Overwrite a bundle's status conditions, as the work agent would
    pub fn set_conditions(&self, cluster: &str, name: &str, conditions: Vec<Condition>) -> bool {
        match self.works.get_mut(&(cluster.to_string(), name.to_string())) {
            Some(mut work) => {
                work.status.get_or_insert_with(ManifestWorkStatus::default).conditions = conditions;
                true
            }
            None => false,
        }
    }

    /// Store a bundle as-is, bypassing name and UID assignment
    pub fn insert_work(&self, cluster: &str, work: ManifestWork) {
        let name = work.name().to_string();
        self.works.insert((cluster.to_string(), name), work);
    }

    /// Read a bundle without counting it as a `get_work` call
    pub fn peek_work(&self, cluster: &str, name: &str) -> Option<ManifestWork> {
        self.works
            .get(&(cluster.to_string(), name.to_string()))
            .map(|w| w.clone())
    }

    /// Number of `get_work` calls served so far
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn work_count(&self) -> usize {
        self.works.len()
    }

    fn check_available(&self, cluster: &str) -> Result<()> {
        if self.unavailable.contains(cluster) {
            return Err(ControlPlaneError::Unavailable(format!(
                "cluster {cluster} is unreachable"
            )));
        }
        Ok(())
    }

    fn key(cluster: &str, name: &str) -> (String, String) {
        (cluster.to_string(), name.to_string())
    }
}

impl Default for InMemoryControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

/// Random suffix in the style of the API server's generated names
fn name_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..5].to_string()
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    async fn create_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork> {
        self.check_available(cluster)?;

        let mut created = work.clone();
        let name = match (&work.metadata.name, &work.metadata.generate_name) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(prefix)) if !prefix.is_empty() => format!("{prefix}{}", name_suffix()),
            _ => return Err(ControlPlaneError::Unnamed { kind: WORK_KIND }),
        };

        let key = Self::key(cluster, &name);
        if self.works.contains_key(&key) {
            return Err(ControlPlaneError::AlreadyExists {
                kind: WORK_KIND,
                name,
            });
        }

        created.metadata.name = Some(name);
        created.metadata.namespace = Some(cluster.to_string());
        created.metadata.uid = Some(Uuid::new_v4().to_string());
        created.status = if self.initial_conditions.is_empty() {
            None
        } else {
            Some(ManifestWorkStatus {
                conditions: self.initial_conditions.clone(),
                resource_status: None,
            })
        };

        self.works.insert(key, created.clone());
        Ok(created)
    }

    async fn get_work(&self, cluster: &str, name: &str) -> Result<Option<ManifestWork>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available(cluster)?;
        Ok(self.peek_work(cluster, name))
    }

    async fn update_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork> {
        self.check_available(cluster)?;

        let name = work
            .metadata
            .name
            .as_deref()
            .ok_or(ControlPlaneError::Unnamed { kind: WORK_KIND })?;
        let mut existing = self
            .works
            .get_mut(&Self::key(cluster, name))
            .ok_or_else(|| ControlPlaneError::NotFound {
                kind: WORK_KIND,
                name: name.to_string(),
            })?;

        existing.spec = work.spec.clone();
        existing.metadata.annotations = work.metadata.annotations.clone();
        existing.metadata.labels = work.metadata.labels.clone();
        Ok(existing.clone())
    }

    async fn delete_work(&self, cluster: &str, name: &str) -> Result<()> {
        self.check_available(cluster)?;
        self.works
            .remove(&Self::key(cluster, name))
            .map(|_| ())
            .ok_or_else(|| ControlPlaneError::NotFound {
                kind: WORK_KIND,
                name: name.to_string(),
            })
    }

    async fn list_works(&self, cluster: &str) -> Result<Vec<ManifestWork>> {
        self.check_available(cluster)?;
        let mut works: Vec<ManifestWork> = self
            .works
            .iter()
            .filter(|entry| entry.key().0 == cluster)
            .map(|entry| entry.value().clone())
            .collect();
        works.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(works)
    }

    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>> {
        if self.clusters_unavailable.load(Ordering::SeqCst) {
            return Err(ControlPlaneError::Unavailable(
                "cannot list managed clusters".to_string(),
            ));
        }
        let mut clusters: Vec<ManagedCluster> =
            self.clusters.iter().map(|c| c.value().clone()).collect();
        clusters.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(clusters)
    }

    async fn get_cluster_manager(&self, name: &str) -> Result<ClusterManager> {
        match &self.owner_uid {
            Some(uid) if name == CLUSTER_MANAGER_NAME => {
                let mut manager = ClusterManager::new(name, ClusterManagerSpec::default());
                manager.metadata.uid = Some(uid.clone());
                Ok(manager)
            }
            _ => Err(ControlPlaneError::NotFound {
                kind: "ClusterManager",
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ManifestWorkSpec;

    fn work(generate_name: &str) -> ManifestWork {
        let mut work = ManifestWork::new("", ManifestWorkSpec::default());
        work.metadata.name = None;
        work.metadata.generate_name = Some(generate_name.to_string());
        work
    }

    #[tokio::test]
    async fn test_create_assigns_name_and_uid() {
        let plane = InMemoryControlPlane::new();
        let created = plane.create_work("cluster1", &work("web-")).await.unwrap();

        assert!(created.name().starts_with("web-"));
        assert_eq!(created.name().len(), "web-".len() + 5);
        assert!(Uuid::parse_str(created.uid()).is_ok());
        assert_eq!(created.metadata.namespace.as_deref(), Some("cluster1"));
        assert!(created.conditions().is_empty());
    }

    #[tokio::test]
    async fn test_create_attaches_initial_conditions() {
        let plane = InMemoryControlPlane::new()
            .with_initial_conditions(vec![Condition::new("Applied", "True")]);
        let created = plane.create_work("cluster1", &work("web-")).await.unwrap();
        assert_eq!(created.conditions().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_status() {
        let plane = InMemoryControlPlane::new();
        let created = plane.create_work("cluster1", &work("web-")).await.unwrap();
        plane.set_conditions("cluster1", created.name(), vec![Condition::new("Available", "True")]);

        let updated = plane.update_work("cluster1", &created).await.unwrap();
        assert_eq!(updated.conditions()[0].type_, "Available");
        assert_eq!(updated.uid(), created.uid());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_work() {
        let plane = InMemoryControlPlane::new();
        let mut missing = work("web-");
        missing.metadata.name = Some("web-abcde".to_string());

        assert!(matches!(
            plane.update_work("cluster1", &missing).await,
            Err(ControlPlaneError::NotFound { .. })
        ));
        assert!(matches!(
            plane.delete_work("cluster1", "web-abcde").await,
            Err(ControlPlaneError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_counts_calls() {
        let plane = InMemoryControlPlane::new();
        assert!(plane.get_work("cluster1", "nope").await.unwrap().is_none());
        assert!(plane.get_work("cluster1", "nope").await.unwrap().is_none());
        assert_eq!(plane.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_cluster() {
        let plane = InMemoryControlPlane::new();
        plane.fail_cluster("cluster1");
        assert!(matches!(
            plane.list_works("cluster1").await,
            Err(ControlPlaneError::Unavailable(_))
        ));
        assert!(plane.list_works("cluster2").await.unwrap().is_empty());
    }
}
