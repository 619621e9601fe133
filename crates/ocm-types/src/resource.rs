//! Resource types
//!
//! A Resource mirrors the work bundle deployed for a job. Its conditions are
//! an append-only history; the last entry is the authoritative one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type appended when a bundle no longer exists on the hub
pub const APPLIED_CONDITION: &str = "Applied";

/// Local mirror of a deployed work bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Record identifier assigned by the job manager
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub job_id: String,

    /// UID assigned by the control plane
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_uuid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Resource observed on the hub, not yet correlated to a job
    pub fn observed(uuid: impl Into<String>, name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            resource_uuid: uuid.into(),
            resource_name: name.into(),
            conditions,
            ..Self::default()
        }
    }

    pub fn last_condition(&self) -> Option<&Condition> {
        self.conditions.last()
    }
}

/// Status fact reported by the control plane
///
/// Field names follow the Kubernetes condition encoding so conditions read
/// from the hub and conditions stored by the job manager share one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub message: String,
}

impl Condition {
    pub fn new(type_: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    /// Synthetic condition recorded for a deleted bundle
    pub fn applied() -> Self {
        Self {
            type_: APPLIED_CONDITION.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_uses_kubernetes_field_names() {
        let json = r#"{
            "type": "Available",
            "status": "True",
            "observedGeneration": 2,
            "lastTransitionTime": "2024-03-01T10:00:05Z",
            "reason": "ResourcesAvailable",
            "message": "All resources are available"
        }"#;
        let condition: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(condition.type_, "Available");
        assert_eq!(condition.observed_generation, Some(2));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_synthetic_applied_condition_has_null_time() {
        let value = serde_json::to_value(Condition::applied()).unwrap();
        assert_eq!(value["type"], "Applied");
        assert!(value["lastTransitionTime"].is_null());
    }

    #[test]
    fn test_observed_resource_skips_empty_fields() {
        let resource = Resource::observed("7d4f-uid", "web-x7k2p", vec![]);
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["resource_uuid"], "7d4f-uid");
        assert!(value.get("conditions").is_none());
        assert_eq!(resource.last_condition(), None);
    }
}
