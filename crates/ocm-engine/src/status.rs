//! Status mapping from hub conditions to job state

use crate::crd::ManifestWork;
use ocm_types::{Condition, Job, JobState};
use tracing::debug;

/// State named by the most recent condition
///
/// Unknown condition types, and an empty history, map to `Applied`.
pub fn derive_state(conditions: &[Condition]) -> JobState {
    match conditions.last().map(|c| c.type_.as_str()) {
        Some("Progressing") => JobState::Progressing,
        Some("Available") => JobState::Available,
        Some("Degraded") => JobState::Degraded,
        _ => JobState::Applied,
    }
}

/// Reflect a bundle's observed status onto its job
///
/// `None` means the bundle is gone: the job becomes `Applied`, its resource
/// name is cleared and a synthetic `Applied` condition is appended.
pub fn reflect(job: &mut Job, work: Option<&ManifestWork>) {
    match work {
        Some(work) => {
            let conditions = work.conditions();
            job.state = Some(if conditions.is_empty() {
                JobState::Progressing
            } else {
                derive_state(conditions)
            });

            let resource = job.resource_mut();
            resource.resource_uuid = work.uid().to_string();
            resource.resource_name = work.name().to_string();
            resource.conditions.extend_from_slice(conditions);
        }
        None => {
            job.state = Some(JobState::Applied);
            let resource = job.resource_mut();
            resource.resource_name.clear();
            resource.conditions.push(Condition::applied());
        }
    }

    debug!(
        job_id = %job.id,
        state = ?job.state,
        conditions = job.resource.as_ref().map(|r| r.conditions.len()).unwrap_or(0),
        "Reflected bundle status onto job"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ManifestWorkSpec, ManifestWorkStatus};
    use ocm_types::{Resource, APPLIED_CONDITION};

    fn conditions(types: &[&str]) -> Vec<Condition> {
        types.iter().map(|t| Condition::new(*t, "True")).collect()
    }

    fn work(types: &[&str]) -> ManifestWork {
        let mut work = ManifestWork::new("web-x1y2z", ManifestWorkSpec::default());
        work.metadata.uid = Some("c0ffee00-0000-4000-8000-000000000001".to_string());
        work.status = Some(ManifestWorkStatus {
            conditions: conditions(types),
            resource_status: None,
        });
        work
    }

    #[test]
    fn test_derive_state_uses_last_condition() {
        assert_eq!(derive_state(&conditions(&["Progressing"])), JobState::Progressing);
        assert_eq!(
            derive_state(&conditions(&["Progressing", "Available"])),
            JobState::Available
        );
        assert_eq!(derive_state(&conditions(&["Available", "Degraded"])), JobState::Degraded);
        assert_eq!(derive_state(&conditions(&["Applied"])), JobState::Applied);
        assert_eq!(derive_state(&conditions(&["Whatever"])), JobState::Applied);
    }

    #[test]
    fn test_derive_state_empty_does_not_panic() {
        assert_eq!(derive_state(&[]), JobState::Applied);
    }

    #[test]
    fn test_reflect_without_conditions_is_progressing() {
        let mut job = Job::default();
        reflect(&mut job, Some(&work(&[])));
        assert_eq!(job.state, Some(JobState::Progressing));
        assert_eq!(job.resource_name(), Some("web-x1y2z"));
    }

    #[test]
    fn test_reflect_appends_conditions() {
        let mut job = Job {
            id: "job-1".to_string(),
            resource: Some(Resource {
                conditions: conditions(&["Applied"]),
                ..Resource::default()
            }),
            ..Job::default()
        };

        reflect(&mut job, Some(&work(&["Progressing", "Available"])));

        let resource = job.resource.as_ref().unwrap();
        assert_eq!(job.state, Some(JobState::Available));
        assert_eq!(resource.resource_uuid, "c0ffee00-0000-4000-8000-000000000001");
        assert_eq!(resource.conditions.len(), 3);
        assert_eq!(resource.last_condition().unwrap().type_, "Available");
    }

    #[test]
    fn test_reflect_deleted_bundle() {
        let mut job = Job {
            resource: Some(Resource {
                resource_name: "web-x1y2z".to_string(),
                conditions: conditions(&["Available"]),
                ..Resource::default()
            }),
            ..Job::default()
        };

        reflect(&mut job, None);

        let resource = job.resource.as_ref().unwrap();
        assert_eq!(job.state, Some(JobState::Applied));
        assert!(resource.resource_name.is_empty());
        assert_eq!(resource.conditions.len(), 2);
        assert_eq!(resource.conditions[1].type_, APPLIED_CONDITION);
    }
}
