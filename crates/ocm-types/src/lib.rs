//! OCM Types - Core types for the deployment manager
//!
//! These are the wire types exchanged with the ICOS job manager. Jobs arrive
//! fully formed; the engine mutates their state and resource record and hands
//! them back.
//!
//! ## Key Concepts
//!
//! - **Job**: a deployment or remediation request with its manifests and target
//! - **Target**: the managed cluster (and node) a job is placed on
//! - **Resource**: local mirror of the work bundle deployed for a job
//! - **Condition**: a status fact reported by the control plane

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod job;
pub mod resource;

pub use error::TypeError;
pub use job::{
    Job, JobState, JobType, OrchestratorType, PlainManifest, RemediationType, Target,
};
pub use resource::{Condition, Resource, APPLIED_CONDITION};
