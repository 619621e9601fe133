//! Batch execution of pulled jobs
//!
//! Jobs run one after another. Each executable job is promoted with the job
//! manager, executed, and on success pushed back. Failures are logged and the
//! batch moves on; nothing is rolled back.

use crate::error::ReportError;
use crate::executor::JobExecutor;
use async_trait::async_trait;
use ocm_types::Job;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// The job manager as seen by the batch runner
#[async_trait]
pub trait JobReporter: Send + Sync {
    /// Claim a job for this orchestrator
    async fn promote_job(&self, job_id: &str, owner_id: &str) -> Result<(), ReportError>;

    /// Push a job's new state and resource
    async fn update_job(&self, job: &Job) -> Result<(), ReportError>;
}

/// Outcome of one batch, by job id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub job_id: String,
    pub error: String,
}

impl BatchReport {
    fn fail(&mut self, job_id: &str, error: impl ToString) {
        self.failed.push(BatchFailure {
            job_id: job_id.to_string(),
            error: error.to_string(),
        });
    }
}

impl JobExecutor {
    /// Execute `jobs` in order on behalf of `owner_id`
    ///
    /// Jobs without a target node are skipped untouched. A job whose
    /// promotion fails is not executed. A job whose execution fails is not
    /// pushed back. A failed push is only logged.
    #[instrument(skip(self, jobs, reporter), fields(jobs = jobs.len(), owner_id = %owner_id))]
    pub async fn execute_batch(
        &self,
        jobs: &mut [Job],
        owner_id: &str,
        reporter: &dyn JobReporter,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for job in jobs.iter_mut() {
            if !job.is_executable() {
                info!(job_id = %job.id, "No target node provided, skipping job");
                report.skipped.push(job.id.clone());
                continue;
            }

            job.owner_id = owner_id.to_string();
            if let Err(e) = reporter.promote_job(&job.id, owner_id).await {
                warn!(job_id = %job.id, error = %e, "Error promoting job");
                report.fail(&job.id, e);
                continue;
            }

            if let Err(e) = self.execute(job).await {
                warn!(job_id = %job.id, error = %e, "Error executing job");
                report.fail(&job.id, e);
                continue;
            }

            if let Err(e) = reporter.update_job(job).await {
                warn!(job_id = %job.id, error = %e, "Error pushing job update");
            }
            report.executed.push(job.id.clone());
        }

        info!(
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Batch finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_plane::InMemoryControlPlane;
    use crate::convergence::ConvergenceConfig;
    use ocm_types::{Condition, JobState, JobType, PlainManifest, Target};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Records every call; fails the ids it is told to
    #[derive(Default)]
    struct RecordingReporter {
        promoted: Mutex<Vec<(String, String)>>,
        updated: Mutex<Vec<Job>>,
        reject_promotion: HashSet<String>,
        reject_update: bool,
    }

    #[async_trait]
    impl JobReporter for RecordingReporter {
        async fn promote_job(&self, job_id: &str, owner_id: &str) -> Result<(), ReportError> {
            self.promoted
                .lock()
                .unwrap()
                .push((job_id.to_string(), owner_id.to_string()));
            if self.reject_promotion.contains(job_id) {
                return Err(ReportError("409 Conflict".to_string()));
            }
            Ok(())
        }

        async fn update_job(&self, job: &Job) -> Result<(), ReportError> {
            self.updated.lock().unwrap().push(job.clone());
            if self.reject_update {
                return Err(ReportError("503 Service Unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn job(id: &str, job_type: JobType, node: &str) -> Job {
        Job {
            id: id.to_string(),
            job_group_name: "shop".to_string(),
            job_type,
            namespace: "shop-ns".to_string(),
            manifests: vec![PlainManifest::new(
                1,
                "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\n",
            )],
            target: Target {
                cluster_name: "cluster1".to_string(),
                node_name: node.to_string(),
                ..Target::default()
            },
            ..Job::default()
        }
    }

    fn executor() -> JobExecutor {
        let plane = InMemoryControlPlane::new()
            .with_initial_conditions(vec![Condition::new("Available", "True")]);
        JobExecutor::new(Arc::new(plane), ConvergenceConfig::default())
    }

    #[tokio::test]
    async fn test_jobs_without_node_are_untouched() {
        let reporter = RecordingReporter::default();
        let original = job("job-1", JobType::CreateDeployment, "");
        let mut jobs = vec![original.clone()];

        let report = executor().execute_batch(&mut jobs, "owner-1", &reporter).await;

        assert_eq!(jobs[0], original);
        assert_eq!(report.skipped, vec!["job-1"]);
        assert!(reporter.promoted.lock().unwrap().is_empty());
        assert!(reporter.updated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_jobs_are_pushed() {
        let reporter = RecordingReporter::default();
        let mut jobs = vec![
            job("job-1", JobType::CreateDeployment, "node1"),
            job("job-2", JobType::CreateDeployment, ""),
        ];

        let report = executor().execute_batch(&mut jobs, "owner-1", &reporter).await;

        assert_eq!(report.executed, vec!["job-1"]);
        assert_eq!(report.skipped, vec!["job-2"]);
        assert_eq!(
            *reporter.promoted.lock().unwrap(),
            vec![("job-1".to_string(), "owner-1".to_string())]
        );

        let updated = reporter.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].owner_id, "owner-1");
        assert_eq!(updated[0].state, Some(JobState::Available));
        assert_eq!(jobs[0].state, Some(JobState::Available));
    }

    #[tokio::test]
    async fn test_failed_promotion_skips_execution() {
        let reporter = RecordingReporter {
            reject_promotion: HashSet::from(["job-1".to_string()]),
            ..RecordingReporter::default()
        };
        let mut jobs = vec![
            job("job-1", JobType::CreateDeployment, "node1"),
            job("job-2", JobType::CreateDeployment, "node1"),
        ];

        let report = executor().execute_batch(&mut jobs, "owner-1", &reporter).await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].job_id, "job-1");
        assert_eq!(report.executed, vec!["job-2"]);
        assert_eq!(jobs[0].state, None);
        assert!(jobs[0].resource.is_none());
    }

    #[tokio::test]
    async fn test_failed_execution_is_not_pushed() {
        let reporter = RecordingReporter::default();
        let mut jobs = vec![
            job("job-1", JobType::Unsupported(99), "node1"),
            job("job-2", JobType::CreateDeployment, "node1"),
        ];

        let report = executor().execute_batch(&mut jobs, "owner-1", &reporter).await;

        assert!(report.failed[0].error.contains("job type not supported"));
        assert_eq!(report.executed, vec!["job-2"]);
        let updated = reporter.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].id, "job-2");
    }

    #[tokio::test]
    async fn test_failed_push_is_best_effort() {
        let reporter = RecordingReporter {
            reject_update: true,
            ..RecordingReporter::default()
        };
        let mut jobs = vec![job("job-1", JobType::CreateDeployment, "node1")];

        let report = executor().execute_batch(&mut jobs, "owner-1", &reporter).await;

        assert_eq!(report.executed, vec!["job-1"]);
        assert!(report.failed.is_empty());
        assert_eq!(jobs[0].state, Some(JobState::Available));
    }
}
