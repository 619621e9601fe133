//! Job Executor
//!
//! Dispatches a job to the control plane operation its type and sub-type
//! call for, then records the outcome on the job. A failed dispatch leaves
//! the job `Degraded` and returns the error; callers decide whether to carry
//! on with other jobs.

use crate::control_plane::ControlPlane;
use crate::convergence::{wait_for_convergence, ConvergenceConfig};
use crate::crd::{Manifest, ManifestWork};
use crate::error::{ControlPlaneError, EngineError, Result, TranslateError};
use crate::scaling;
use crate::status::reflect;
use crate::translator::{self, Provenance, WorkloadObject};
use ocm_types::{Job, JobState, JobType, RemediationType};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Executes jobs against one control plane
#[derive(Clone)]
pub struct JobExecutor {
    plane: Arc<dyn ControlPlane>,
    convergence: ConvergenceConfig,
}

impl JobExecutor {
    pub fn new(plane: Arc<dyn ControlPlane>, convergence: ConvergenceConfig) -> Self {
        Self { plane, convergence }
    }

    pub fn control_plane(&self) -> &Arc<dyn ControlPlane> {
        &self.plane
    }

    /// Execute a single job, updating its state and resource in place
    #[instrument(skip(self, job), fields(job_id = %job.id, job_type = %job.job_type))]
    pub async fn execute(&self, job: &mut Job) -> Result<()> {
        info!("Executing job");
        match job.job_type {
            JobType::CreateDeployment => self.create(job).await,
            JobType::UpdateDeployment => self.update(job).await,
            JobType::DeleteDeployment => self.delete(job).await,
            JobType::ReplaceDeployment => self.replace(job).await,
            unsupported @ JobType::Unsupported(_) => {
                Err(degrade(job, EngineError::UnsupportedJobType(unsupported)))
            }
        }
    }

    /// Render and submit a new bundle, then wait for the hub to report on it
    #[instrument(skip(self, job), fields(job_id = %job.id, cluster = %job.target.cluster_name))]
    pub async fn create(&self, job: &mut Job) -> Result<()> {
        let cluster = job.target.cluster_name.clone();

        let work = match translator::generate_work(job) {
            Ok(work) => work,
            Err(e) => return Err(degrade(job, e.into())),
        };
        let created = match self.plane.create_work(&cluster, &work).await {
            Ok(created) => created,
            Err(e) => return Err(degrade(job, e.into())),
        };

        if created.uid().is_empty() {
            warn!(name = created.name(), "Created ManifestWork has no UID, not waiting for status");
            return Ok(());
        }
        info!(name = created.name(), uid = created.uid(), "ManifestWork created");

        let namespace = created
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| cluster.clone());
        let converged =
            match wait_for_convergence(self.plane.as_ref(), &namespace, created.name(), &self.convergence)
                .await
            {
                Ok(converged) => converged,
                Err(e) => return Err(degrade(job, e)),
            };

        reflect(job, Some(&converged));
        Ok(())
    }

    /// Swap the manifests of an existing bundle for freshly rendered ones
    #[instrument(skip(self, job), fields(job_id = %job.id, cluster = %job.target.cluster_name))]
    pub async fn replace(&self, job: &mut Job) -> Result<()> {
        let cluster = job.target.cluster_name.clone();
        let name = require_resource_name(job)?;
        let mut work = self.fetch_existing(job, &cluster, &name).await?;

        let provenance = Provenance::for_job(job);
        work.spec.workload.manifests =
            translator::render_manifests(&job.manifests, &job.namespace, &provenance);

        let updated = self.submit_update(job, &cluster, &work).await?;
        reflect(job, Some(&updated));
        Ok(())
    }

    /// Remediate a deployed bundle
    pub async fn update(&self, job: &mut Job) -> Result<()> {
        let sub_type = job.sub_type.clone();
        match sub_type {
            RemediationType::ScaleUp
            | RemediationType::ScaleDown
            | RemediationType::ScaleOut
            | RemediationType::ScaleIn => self.update_attributes(job).await,
            RemediationType::Reallocation => self.delete(job).await,
            other => Err(degrade(job, EngineError::UnsupportedSubType(other))),
        }
    }

    /// Rescale the workloads of an existing bundle
    #[instrument(skip(self, job), fields(job_id = %job.id, sub_type = %job.sub_type))]
    pub async fn update_attributes(&self, job: &mut Job) -> Result<()> {
        let cluster = job.target.cluster_name.clone();
        let name = require_resource_name(job)?;
        let mut work = self.fetch_existing(job, &cluster, &name).await?;

        let namespace = match translator::namespace_manifest(&job.namespace) {
            Ok(manifest) => manifest,
            Err(e) => return Err(degrade(job, e.into())),
        };

        let mut manifests = vec![namespace];
        manifests.extend(rescale_workload(work.manifests(), &job.sub_type));
        work.spec.workload.manifests = manifests;

        let updated = self.submit_update(job, &cluster, &work).await?;
        reflect(job, Some(&updated));
        Ok(())
    }

    /// Remove the job's bundle from its cluster
    #[instrument(skip(self, job), fields(job_id = %job.id, cluster = %job.target.cluster_name))]
    pub async fn delete(&self, job: &mut Job) -> Result<()> {
        let cluster = job.target.cluster_name.clone();
        let name = require_resource_name(job)?;

        if let Err(e) = self.plane.delete_work(&cluster, &name).await {
            return Err(degrade(job, e.into()));
        }

        info!(name = %name, "ManifestWork deleted");
        reflect(job, None);
        Ok(())
    }

    async fn fetch_existing(&self, job: &mut Job, cluster: &str, name: &str) -> Result<ManifestWork> {
        match self.plane.get_work(cluster, name).await {
            Ok(Some(work)) => Ok(work),
            Ok(None) => Err(degrade(
                job,
                ControlPlaneError::NotFound {
                    kind: "ManifestWork",
                    name: name.to_string(),
                }
                .into(),
            )),
            Err(e) => Err(degrade(job, e.into())),
        }
    }

    async fn submit_update(&self, job: &mut Job, cluster: &str, work: &ManifestWork) -> Result<ManifestWork> {
        match self.plane.update_work(cluster, work).await {
            Ok(updated) => {
                info!(name = updated.name(), manifests = updated.manifests().len(), "ManifestWork updated");
                Ok(updated)
            }
            Err(e) => Err(degrade(job, e.into())),
        }
    }
}

/// Mark the job degraded and hand the error back
fn degrade(job: &mut Job, err: EngineError) -> EngineError {
    warn!(job_id = %job.id, error = %err, "Job degraded");
    job.state = Some(JobState::Degraded);
    err
}

fn require_resource_name(job: &mut Job) -> Result<String> {
    if let Some(name) = job.resource_name() {
        return Ok(name.to_string());
    }
    let job_id = job.id.clone();
    Err(degrade(job, EngineError::MissingResource { job_id }))
}

/// Run every manifest of a deployed bundle through the scaling policy
///
/// Namespace objects are dropped, since the caller prepends a fresh one.
/// Kinds the translator does not decode pass through unchanged. A manifest
/// that fails to decode or scale is dropped and the rest are still processed.
fn rescale_workload(manifests: &[Manifest], sub_type: &RemediationType) -> Vec<Manifest> {
    let mut rescaled = Vec::with_capacity(manifests.len());
    for manifest in manifests {
        if manifest.kind() == Some("Namespace") {
            continue;
        }

        let mut object = match WorkloadObject::from_value(manifest.0.clone()) {
            Ok(object) => object,
            Err(TranslateError::UnsupportedKind { kind, .. }) => {
                debug!(kind = %kind, "Keeping manifest of unmanaged kind");
                rescaled.push(manifest.clone());
                continue;
            }
            Err(e) => {
                warn!(error = %e, "Dropping manifest that failed to decode");
                continue;
            }
        };

        if let Err(e) = scaling::apply(&mut object, sub_type) {
            warn!(kind = object.kind(), error = %e, "Dropping manifest that failed to scale");
            continue;
        }

        match object.into_manifest() {
            Ok(m) => rescaled.push(m),
            Err(e) => warn!(error = %e, "Dropping manifest that failed to encode"),
        }
    }
    rescaled
}
