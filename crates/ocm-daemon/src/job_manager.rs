//! HTTP client for the job manager
//!
//! Every call forwards the caller's `Authorization` header verbatim; the job
//! manager, not this service, decides what the caller may do.

use async_trait::async_trait;
use ocm_engine::{JobReporter, ReportError};
use ocm_types::{Job, OrchestratorType, Resource};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Job manager client errors
#[derive(Debug, Error)]
pub enum JobManagerError {
    /// Client could not be built
    #[error("Client error: {0}")]
    Client(reqwest::Error),

    /// Request never got an answer
    #[error("Job manager unreachable: {0}")]
    Unreachable(reqwest::Error),

    /// Non-success status
    #[error("Job manager returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded
    #[error("Invalid job manager response ({status}): {message}")]
    Decode { status: u16, message: String },
}

/// Body of a promote request
#[derive(Debug, Serialize)]
struct PromoteRequest<'a> {
    owner_id: &'a str,
}

/// Client for the job manager REST API
#[derive(Debug, Clone)]
pub struct JobManagerClient {
    client: Client,
    base_url: String,
}

impl JobManagerClient {
    /// Create a new job manager client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, JobManagerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(JobManagerError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Jobs ready to run on the orchestrator identified by `owner_id`
    pub async fn executable_jobs(
        &self,
        owner_id: &str,
        authorization: Option<&str>,
    ) -> Result<Vec<Job>, JobManagerError> {
        let url = self.url(&format!("/jobmanager/jobs/executable/{}/{}", OrchestratorType::Ocm, owner_id));
        info!(url = %url, "Requesting executable jobs");
        let response = send(authorized(self.client.get(&url), authorization)).await?;
        decode(response).await
    }

    /// Claim a job for `owner_id`
    pub async fn promote_job(
        &self,
        job_id: &str,
        owner_id: &str,
        authorization: Option<&str>,
    ) -> Result<(), JobManagerError> {
        let url = self.url(&format!("/jobmanager/jobs/promote/{}", job_id));
        let request = self.client.patch(&url).json(&PromoteRequest { owner_id });
        let response = send(authorized(request, authorization)).await?;
        debug!(job_id, status = %response.status(), "Promote response");
        expect_success(response).await
    }

    /// Push a job's new state and resource
    pub async fn update_job(&self, job: &Job, authorization: Option<&str>) -> Result<(), JobManagerError> {
        let url = self.url("/jobmanager/jobs");
        let request = self
            .client
            .put(&url)
            .query(&[("id", job.id.as_str()), ("orchestrator", OrchestratorType::Ocm.as_str())])
            .json(job);
        let response = send(authorized(request, authorization)).await?;
        debug!(job_id = %job.id, status = %response.status(), "Update job response");
        expect_success(response).await
    }

    /// Push the observed status of a deployed resource
    pub async fn update_resource_status(
        &self,
        resource: &Resource,
        authorization: Option<&str>,
    ) -> Result<(), JobManagerError> {
        let url = self.url("/jobmanager/resources/status");
        let request = self.client.put(&url).json(resource);
        let response = send(authorized(request, authorization)).await?;
        debug!(
            resource_uuid = %resource.resource_uuid,
            status = %response.status(),
            "Resource status response"
        );
        expect_success(response).await
    }

    /// Reporter that forwards `authorization` on every call
    pub fn session(&self, authorization: Option<String>) -> AuthorizedSession<'_> {
        AuthorizedSession {
            client: self,
            authorization,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn authorized(request: RequestBuilder, authorization: Option<&str>) -> RequestBuilder {
    match authorization {
        Some(value) => request.header(AUTHORIZATION, value),
        None => request,
    }
}

async fn send(request: RequestBuilder) -> Result<Response, JobManagerError> {
    request.send().await.map_err(JobManagerError::Unreachable)
}

async fn expect_success(response: Response) -> Result<(), JobManagerError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(JobManagerError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, JobManagerError> {
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(JobManagerError::Unreachable)?;
    serde_json::from_slice(&body).map_err(|e| JobManagerError::Decode {
        status,
        message: e.to_string(),
    })
}

/// The job manager on behalf of one inbound request
pub struct AuthorizedSession<'a> {
    client: &'a JobManagerClient,
    authorization: Option<String>,
}

#[async_trait]
impl JobReporter for AuthorizedSession<'_> {
    async fn promote_job(&self, job_id: &str, owner_id: &str) -> Result<(), ReportError> {
        self.client
            .promote_job(job_id, owner_id, self.authorization.as_deref())
            .await
            .map_err(|e| ReportError(e.to_string()))
    }

    async fn update_job(&self, job: &Job) -> Result<(), ReportError> {
        self.client
            .update_job(job, self.authorization.as_deref())
            .await
            .map_err(|e| ReportError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeJobManager;
    use ocm_types::{JobState, JobType};

    const TOKEN: &str = "Bearer abc";

    fn client(base_url: &str) -> JobManagerClient {
        JobManagerClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_executable_jobs_forwards_authorization() {
        let fake = FakeJobManager::start(vec![Job {
            id: "job-1".to_string(),
            job_type: JobType::CreateDeployment,
            ..Job::default()
        }])
        .await;

        let jobs = client(&format!("{}/", fake.base_url()))
            .executable_jobs("owner-1", Some(TOKEN))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_type, JobType::CreateDeployment);
        let recorded = fake.recorded();
        assert_eq!(recorded.pulled_by, vec!["owner-1"]);
        assert_eq!(recorded.authorization, vec![Some(TOKEN.to_string())]);
    }

    #[tokio::test]
    async fn test_promote_sends_owner() {
        let fake = FakeJobManager::start(vec![]).await;

        client(&fake.base_url())
            .promote_job("job-1", "owner-1", None)
            .await
            .unwrap();

        assert_eq!(
            fake.recorded().promoted,
            vec![("job-1".to_string(), "owner-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_update_job_query() {
        let fake = FakeJobManager::start(vec![]).await;
        let job = Job {
            id: "job-7".to_string(),
            state: Some(JobState::Available),
            ..Job::default()
        };

        client(&fake.base_url()).update_job(&job, Some(TOKEN)).await.unwrap();

        let recorded = fake.recorded();
        assert_eq!(recorded.updated.len(), 1);
        assert_eq!(recorded.updated[0].0, "job-7");
        assert_eq!(recorded.updated[0].1, "ocm");
        assert_eq!(recorded.updated[0].2.state, Some(JobState::Available));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let fake = FakeJobManager::start(vec![]).await;
        fake.reject_promotions();

        let err = client(&fake.base_url())
            .promote_job("job-1", "owner-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobManagerError::Status { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_undecodable_jobs() {
        let fake = FakeJobManager::start(vec![]).await;
        fake.serve_garbage();

        let err = client(&fake.base_url())
            .executable_jobs("owner-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobManagerError::Decode { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_unreachable() {
        let err = client("http://127.0.0.1:1")
            .executable_jobs("owner-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, JobManagerError::Unreachable(_)));
    }
}
