//! Control plane backed by the Kubernetes API of the OCM hub

use super::{ControlPlane, Result};
use crate::crd::{ClusterManager, ManagedCluster, ManifestWork};
use crate::error::ControlPlaneError;
use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::{debug, info};

const WORK_KIND: &str = "ManifestWork";
const CLUSTER_MANAGER_KIND: &str = "ClusterManager";

/// Hub client shared by every request
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
}

impl KubeControlPlane {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the in-cluster service account, falling back to a
    /// kubeconfig for out-of-cluster development
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match Config::incluster() {
            Ok(config) => {
                info!("Using in-cluster control plane configuration");
                config
            }
            Err(e) => {
                debug!(error = %e, "In-cluster configuration unavailable, using kubeconfig");
                match kubeconfig {
                    Some(path) => {
                        info!(path = %path.display(), "Loading kubeconfig");
                        let kubeconfig = Kubeconfig::read_from(path)
                            .map_err(|e| ControlPlaneError::Config(e.to_string()))?;
                        Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                            .await
                            .map_err(|e| ControlPlaneError::Config(e.to_string()))?
                    }
                    None => Config::infer()
                        .await
                        .map_err(|e| ControlPlaneError::Config(e.to_string()))?,
                }
            }
        };

        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }

    fn works(&self, cluster: &str) -> Api<ManifestWork> {
        Api::namespaced(self.client.clone(), cluster)
    }
}

/// Turn 404 and 409 from the API server into typed errors
fn map_status_as(kind: &'static str, name: &str, err: kube::Error) -> ControlPlaneError {
    match err {
        kube::Error::Api(response) if response.code == 404 => ControlPlaneError::NotFound {
            kind,
            name: name.to_string(),
        },
        kube::Error::Api(response) if response.code == 409 => ControlPlaneError::AlreadyExists {
            kind,
            name: name.to_string(),
        },
        other => ControlPlaneError::Kube(other),
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn create_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork> {
        let name = work
            .metadata
            .name
            .clone()
            .or_else(|| work.metadata.generate_name.clone())
            .unwrap_or_default();
        self.works(cluster)
            .create(&PostParams::default(), work)
            .await
            .map_err(|e| map_status_as(WORK_KIND, &name, e))
    }

    async fn get_work(&self, cluster: &str, name: &str) -> Result<Option<ManifestWork>> {
        Ok(self.works(cluster).get_opt(name).await?)
    }

    async fn update_work(&self, cluster: &str, work: &ManifestWork) -> Result<ManifestWork> {
        let name = work
            .metadata
            .name
            .as_deref()
            .ok_or(ControlPlaneError::Unnamed { kind: WORK_KIND })?;
        self.works(cluster)
            .replace(name, &PostParams::default(), work)
            .await
            .map_err(|e| map_status_as(WORK_KIND, name, e))
    }

    async fn delete_work(&self, cluster: &str, name: &str) -> Result<()> {
        self.works(cluster)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| map_status_as(WORK_KIND, name, e))?;
        Ok(())
    }

    async fn list_works(&self, cluster: &str) -> Result<Vec<ManifestWork>> {
        Ok(self.works(cluster).list(&ListParams::default()).await?.items)
    }

    async fn list_managed_clusters(&self) -> Result<Vec<ManagedCluster>> {
        let api: Api<ManagedCluster> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_cluster_manager(&self, name: &str) -> Result<ClusterManager> {
        let api: Api<ClusterManager> = Api::all(self.client.clone());
        api.get(name)
            .await
            .map_err(|e| map_status_as(CLUSTER_MANAGER_KIND, name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "test".to_string(),
            reason: "Test".to_string(),
            code,
        })
    }

    #[test]
    fn test_map_status_as() {
        assert!(matches!(
            map_status_as(WORK_KIND, "web-abcde", api_error(404)),
            ControlPlaneError::NotFound { name, .. } if name == "web-abcde"
        ));
        assert!(matches!(
            map_status_as(WORK_KIND, "web-abcde", api_error(409)),
            ControlPlaneError::AlreadyExists { .. }
        ));
        assert!(matches!(
            map_status_as(WORK_KIND, "web-abcde", api_error(500)),
            ControlPlaneError::Kube(_)
        ));
    }
}
