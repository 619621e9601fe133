//! Job types
//!
//! A Job is a unit of work pulled from the job manager. Its numeric and string
//! enumerations follow the job manager's encoding so a job can be decoded,
//! executed and pushed back without loss.

use crate::error::TypeError;
use crate::resource::Resource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A deployment or remediation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier assigned by the job manager
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub job_group_id: String,

    /// Identity of the orchestrator that owns the job once promoted
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_id: String,

    #[serde(default)]
    pub job_group_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_group_description: String,

    #[serde(rename = "type", default)]
    pub job_type: JobType,

    #[serde(default, skip_serializing_if = "RemediationType::is_unset")]
    pub sub_type: RemediationType,

    /// Current state; absent until the job has been executed once
    #[serde(default, with = "state_code", skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,

    #[serde(default)]
    pub manifests: Vec<PlainManifest>,

    #[serde(rename = "targets", default)]
    pub target: Target,

    #[serde(default)]
    pub orchestrator: OrchestratorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether the job names a node to run on. Jobs without one are skipped.
    pub fn is_executable(&self) -> bool {
        !self.target.node_name.is_empty()
    }

    /// Name of the work bundle recorded for this job, if any
    pub fn resource_name(&self) -> Option<&str> {
        self.resource
            .as_ref()
            .map(|r| r.resource_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Resource record, created empty on first access
    pub fn resource_mut(&mut self) -> &mut Resource {
        let job_id = self.id.clone();
        self.resource.get_or_insert_with(|| Resource {
            job_id,
            ..Resource::default()
        })
    }
}

/// Where a job's bundle is placed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub id: u32,

    /// Managed cluster name; also the namespace of the work bundle on the hub
    #[serde(default)]
    pub cluster_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node_name: String,

    #[serde(default)]
    pub orchestrator: OrchestratorType,
}

/// One desired-state YAML document owned by a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainManifest {
    #[serde(default)]
    pub id: u32,

    #[serde(rename = "yamlString", default)]
    pub yaml_string: String,
}

impl PlainManifest {
    pub fn new(id: u32, yaml: impl Into<String>) -> Self {
        Self {
            id,
            yaml_string: yaml.into(),
        }
    }
}

/// Orchestrator a job is addressed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorType {
    #[default]
    Ocm,
    Nuvla,
    #[serde(other)]
    Unknown,
}

impl OrchestratorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorType::Ocm => "ocm",
            OrchestratorType::Nuvla => "nuvla",
            OrchestratorType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrchestratorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of job, encoded as an integer on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum JobType {
    CreateDeployment,
    DeleteDeployment,
    UpdateDeployment,
    ReplaceDeployment,
    /// A code this service does not know how to execute
    Unsupported(i64),
}

impl Default for JobType {
    fn default() -> Self {
        JobType::Unsupported(0)
    }
}

impl JobType {
    pub fn code(&self) -> i64 {
        match self {
            JobType::CreateDeployment => 5,
            JobType::DeleteDeployment => 6,
            JobType::UpdateDeployment => 7,
            JobType::ReplaceDeployment => 8,
            JobType::Unsupported(code) => *code,
        }
    }
}

impl From<i64> for JobType {
    fn from(code: i64) -> Self {
        match code {
            5 => JobType::CreateDeployment,
            6 => JobType::DeleteDeployment,
            7 => JobType::UpdateDeployment,
            8 => JobType::ReplaceDeployment,
            other => JobType::Unsupported(other),
        }
    }
}

impl From<JobType> for i64 {
    fn from(job_type: JobType) -> Self {
        job_type.code()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::CreateDeployment => f.write_str("CreateDeployment"),
            JobType::DeleteDeployment => f.write_str("DeleteDeployment"),
            JobType::UpdateDeployment => f.write_str("UpdateDeployment"),
            JobType::ReplaceDeployment => f.write_str("ReplaceDeployment"),
            JobType::Unsupported(code) => write!(f, "unknownJobType({})", code),
        }
    }
}

/// Remediation sub-type of an update job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RemediationType {
    ScaleUp,
    ScaleDown,
    ScaleOut,
    ScaleIn,
    Reallocation,
    /// Any other value, kept verbatim. Empty means no sub-type was given.
    Other(String),
}

impl Default for RemediationType {
    fn default() -> Self {
        RemediationType::Other(String::new())
    }
}

impl RemediationType {
    pub fn as_str(&self) -> &str {
        match self {
            RemediationType::ScaleUp => "scale-up",
            RemediationType::ScaleDown => "scale-down",
            RemediationType::ScaleOut => "scale-out",
            RemediationType::ScaleIn => "scale-in",
            RemediationType::Reallocation => "reallocation",
            RemediationType::Other(value) => value,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, RemediationType::Other(value) if value.is_empty())
    }

    /// Replica count adjustments
    pub fn is_horizontal(&self) -> bool {
        matches!(self, RemediationType::ScaleUp | RemediationType::ScaleDown)
    }

    /// Resource request adjustments
    pub fn is_vertical(&self) -> bool {
        matches!(self, RemediationType::ScaleOut | RemediationType::ScaleIn)
    }
}

impl From<String> for RemediationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "scale-up" => RemediationType::ScaleUp,
            "scale-down" => RemediationType::ScaleDown,
            "scale-out" => RemediationType::ScaleOut,
            "scale-in" => RemediationType::ScaleIn,
            "reallocation" => RemediationType::Reallocation,
            _ => RemediationType::Other(value),
        }
    }
}

impl From<RemediationType> for String {
    fn from(value: RemediationType) -> Self {
        match value {
            RemediationType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RemediationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job state derived from the work bundle's conditions
///
/// 1. Applied: the workload was applied on the managed cluster
/// 2. Progressing: the workload is being applied
/// 3. Available: the workload exists on the managed cluster
/// 4. Degraded: the workload does not match the desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JobState {
    Applied,
    Progressing,
    Available,
    Degraded,
}

impl JobState {
    pub fn code(&self) -> u8 {
        match self {
            JobState::Applied => 1,
            JobState::Progressing => 2,
            JobState::Available => 3,
            JobState::Degraded => 4,
        }
    }
}

impl TryFrom<u8> for JobState {
    type Error = TypeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(JobState::Applied),
            2 => Ok(JobState::Progressing),
            3 => Ok(JobState::Available),
            4 => Ok(JobState::Degraded),
            other => Err(TypeError::InvalidJobState(other)),
        }
    }
}

impl From<JobState> for u8 {
    fn from(state: JobState) -> Self {
        state.code()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Applied => "Applied",
            JobState::Progressing => "Progressing",
            JobState::Available => "Available",
            JobState::Degraded => "Degraded",
        };
        f.write_str(name)
    }
}

/// `0` on the wire means the state has not been set yet
mod state_code {
    use super::JobState;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(state: &Option<JobState>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(state.map(|s| s.code()).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<JobState>, D::Error> {
        match Option::<u8>::deserialize(deserializer)? {
            None | Some(0) => Ok(None),
            Some(code) => JobState::try_from(code).map(Some).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_JSON: &str = r#"{
        "id": "8f2c3a50-1d2e-4c1b-9a55-0b7f4e1c2d3e",
        "job_group_id": "group-1",
        "job_group_name": "nginx-app",
        "type": 5,
        "state": 0,
        "manifests": [{"id": 1, "yamlString": "kind: Deployment"}],
        "targets": {"id": 3, "cluster_name": "cluster1", "node_name": "node-a", "orchestrator": "ocm"},
        "orchestrator": "ocm",
        "namespace": "icos-apps",
        "created_at": "2024-03-01T10:00:00Z"
    }"#;

    #[test]
    fn test_decode_job() {
        let job: Job = serde_json::from_str(JOB_JSON).unwrap();
        assert_eq!(job.job_type, JobType::CreateDeployment);
        assert_eq!(job.state, None);
        assert!(job.sub_type.is_unset());
        assert_eq!(job.target.cluster_name, "cluster1");
        assert!(job.is_executable());
        assert_eq!(job.manifests[0].yaml_string, "kind: Deployment");
        assert!(job.resource.is_none());
    }

    #[test]
    fn test_unknown_job_type_is_preserved() {
        let job: Job = serde_json::from_str(r#"{"type": 42}"#).unwrap();
        assert_eq!(job.job_type, JobType::Unsupported(42));

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["type"], 42);
    }

    #[test]
    fn test_state_is_encoded_as_code() {
        let job = Job {
            state: Some(JobState::Available),
            sub_type: RemediationType::ScaleOut,
            ..Job::default()
        };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["state"], 3);
        assert_eq!(value["sub_type"], "scale-out");

        let unset = serde_json::to_value(Job::default()).unwrap();
        assert!(unset.get("state").is_none());
        assert!(unset.get("sub_type").is_none());
    }

    #[test]
    fn test_invalid_state_code_is_rejected() {
        let result: Result<Job, _> = serde_json::from_str(r#"{"state": 9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_remediation_type_keeps_unknown_values() {
        let sub: RemediationType = "scale-sideways".to_string().into();
        assert_eq!(sub, RemediationType::Other("scale-sideways".into()));
        assert!(!sub.is_horizontal());
        assert!(RemediationType::ScaleDown.is_horizontal());
        assert!(RemediationType::ScaleIn.is_vertical());
    }

    #[test]
    fn test_job_without_node_is_not_executable() {
        let mut job = Job::default();
        job.target.cluster_name = "cluster1".into();
        assert!(!job.is_executable());
    }

    #[test]
    fn test_resource_mut_creates_record_for_job() {
        let mut job = Job {
            id: "job-1".into(),
            ..Job::default()
        };
        assert_eq!(job.resource_name(), None);
        job.resource_mut().resource_name = "web-x7k2p".into();
        assert_eq!(job.resource.as_ref().unwrap().job_id, "job-1");
        assert_eq!(job.resource_name(), Some("web-x7k2p"));
    }
}
