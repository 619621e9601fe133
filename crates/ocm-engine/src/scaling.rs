//! Scaling policy
//!
//! Pure arithmetic over decoded Deployments. Horizontal remediation moves the
//! replica count by one; vertical remediation moves the first container's CPU
//! and memory requests by a fixed step.

use crate::error::{QuantityError, ScalingError};
use crate::quantity::{self, Notation};
use crate::translator::WorkloadObject;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use ocm_types::RemediationType;
use std::collections::BTreeMap;
use tracing::debug;

/// CPU step for vertical scaling, in millicores
pub const CPU_STEP_MILLIS: i128 = 1000;

/// Memory step for vertical scaling, in bytes (1000Mi)
pub const MEMORY_STEP_BYTES: i128 = 1000 * 1024 * 1024;

/// Replica count the API server assumes when none is set
const DEFAULT_REPLICAS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    fn key(self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
        }
    }

    fn step_millis(self) -> i128 {
        match self {
            ResourceKind::Cpu => CPU_STEP_MILLIS,
            ResourceKind::Memory => MEMORY_STEP_BYTES * 1000,
        }
    }
}

/// Apply a remediation to one decoded object
///
/// Only Deployments are touched; every other kind passes through unchanged.
pub fn apply(object: &mut WorkloadObject, sub_type: &RemediationType) -> Result<(), ScalingError> {
    match sub_type {
        RemediationType::ScaleUp
        | RemediationType::ScaleDown
        | RemediationType::ScaleOut
        | RemediationType::ScaleIn => {}
        other => return Err(ScalingError::UnsupportedSubType(other.as_str().to_string())),
    }

    let WorkloadObject::Deployment(deployment) = object else {
        return Ok(());
    };

    if sub_type.is_horizontal() {
        horizontal(deployment, sub_type);
        Ok(())
    } else {
        vertical(deployment, sub_type)
    }
}

/// Next replica count; never below zero
pub fn scale_replicas(replicas: i32, sub_type: &RemediationType) -> i32 {
    match sub_type {
        RemediationType::ScaleUp => replicas.saturating_add(1),
        RemediationType::ScaleDown => replicas.saturating_sub(1).max(0),
        _ => replicas,
    }
}

pub fn horizontal(deployment: &mut Deployment, sub_type: &RemediationType) {
    let spec = deployment.spec.get_or_insert_with(Default::default);
    let current = spec.replicas.unwrap_or(DEFAULT_REPLICAS);
    let next = scale_replicas(current, sub_type);
    debug!(current, next, "Scaling replicas");
    spec.replicas = Some(next);
}

pub fn vertical(deployment: &mut Deployment, sub_type: &RemediationType) -> Result<(), ScalingError> {
    let sign = match sub_type {
        RemediationType::ScaleOut => 1,
        RemediationType::ScaleIn => -1,
        _ => return Ok(()),
    };

    let name = deployment.metadata.name.clone().unwrap_or_default();
    let container = deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.containers.first_mut())
        .ok_or(ScalingError::NoContainers(name))?;

    let requests = container
        .resources
        .get_or_insert_with(Default::default)
        .requests
        .get_or_insert_with(BTreeMap::new);

    for kind in [ResourceKind::Cpu, ResourceKind::Memory] {
        adjust_request(requests, kind, sign * kind.step_millis())?;
    }
    Ok(())
}

/// Shift one request by `delta_millis`; a result below zero is discarded
fn adjust_request(
    requests: &mut BTreeMap<String, Quantity>,
    kind: ResourceKind,
    delta_millis: i128,
) -> Result<(), QuantityError> {
    let current = requests.get(kind.key());
    if let Some(next) = adjust_quantity(current, kind, delta_millis)? {
        debug!(
            resource = kind.key(),
            from = current.map(|q| q.0.as_str()).unwrap_or("0"),
            to = %next.0,
            "Adjusting request"
        );
        requests.insert(kind.key().to_string(), next);
    }
    Ok(())
}

fn adjust_quantity(
    current: Option<&Quantity>,
    kind: ResourceKind,
    delta_millis: i128,
) -> Result<Option<Quantity>, QuantityError> {
    let current_millis = match current {
        Some(q) => quantity::parse_millis(&q.0)?,
        None => 0,
    };
    let next = current_millis
        .checked_add(delta_millis)
        .ok_or_else(|| QuantityError::Overflow(current.map(|q| q.0.clone()).unwrap_or_default()))?;
    if next < 0 {
        return Ok(None);
    }

    let formatted = match kind {
        ResourceKind::Cpu => quantity::format_cpu(next),
        ResourceKind::Memory => {
            let notation = current.map(|q| Notation::of(&q.0)).unwrap_or(Notation::Binary);
            quantity::format_memory(next, notation)
        }
    };
    Ok(Some(Quantity(formatted)))
}
