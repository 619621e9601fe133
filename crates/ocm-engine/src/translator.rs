//! Manifest translation
//!
//! Turns a job's raw YAML manifests into the objects of a work bundle. Every
//! object is moved into the job's namespace and stamped with provenance
//! annotations; every fresh bundle starts with the namespace itself.

use crate::crd::{Manifest, ManifestWork, ManifestWorkSpec};
use crate::error::TranslateError;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use ocm_types::{Job, PlainManifest};
use serde_json::Value;
use tracing::{debug, warn};

pub const ANNOTATION_APP_NAME: &str = "app.icos.eu/name";
pub const ANNOTATION_COMPONENT: &str = "app.icos.eu/component";
pub const ANNOTATION_INSTANCE: &str = "app.icos.eu/instance";
pub const ANNOTATION_MANIFEST: &str = "jobmanager.icos.eu/manifest";

const APPS_V1: &str = "apps/v1";
const CORE_V1: &str = "v1";

const APPS_V1_KINDS: &[&str] = &[
    "Deployment",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "ControllerRevision",
];

const CORE_V1_KINDS: &[&str] = &[
    "Binding",
    "ConfigMap",
    "Endpoints",
    "Event",
    "LimitRange",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "Pod",
    "PodTemplate",
    "ReplicationController",
    "ResourceQuota",
    "Secret",
    "Service",
    "ServiceAccount",
];

/// A decoded manifest
///
/// Deployments are decoded into their typed form because scaling edits them.
/// Every other supported kind is carried as a dynamic object.
#[derive(Debug, Clone)]
pub enum WorkloadObject {
    Deployment(Box<Deployment>),
    Generic(Box<DynamicObject>),
}

impl WorkloadObject {
    pub fn from_yaml(text: &str) -> Result<Self, TranslateError> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, TranslateError> {
        let api_version = value.get("apiVersion").and_then(Value::as_str);
        let kind = value.get("kind").and_then(Value::as_str);
        let (api_version, kind) = match (api_version, kind) {
            (Some(api_version), Some(kind)) => (api_version.to_string(), kind.to_string()),
            _ => return Err(TranslateError::MissingTypeInfo),
        };

        match (api_version.as_str(), kind.as_str()) {
            (APPS_V1, "Deployment") => {
                Ok(Self::Deployment(Box::new(serde_json::from_value(value)?)))
            }
            (APPS_V1, k) if APPS_V1_KINDS.contains(&k) => {
                Ok(Self::Generic(Box::new(serde_json::from_value(value)?)))
            }
            (CORE_V1, k) if CORE_V1_KINDS.contains(&k) => {
                Ok(Self::Generic(Box::new(serde_json::from_value(value)?)))
            }
            _ => Err(TranslateError::UnsupportedKind { api_version, kind }),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::Generic(obj) => obj.types.as_ref().map(|t| t.kind.as_str()).unwrap_or(""),
        }
    }

    pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Deployment(deployment) => &mut deployment.metadata,
            Self::Generic(obj) => &mut obj.metadata,
        }
    }

    pub fn into_manifest(self) -> Result<Manifest, TranslateError> {
        let value = match self {
            Self::Deployment(deployment) => serde_json::to_value(*deployment)?,
            Self::Generic(obj) => serde_json::to_value(*obj)?,
        };
        Ok(Manifest(value))
    }
}

/// Values stamped on every object so it can be traced back to its job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub app_name: String,
    pub component: String,
    pub instance: String,
    pub manifest_id: String,
}

impl Provenance {
    pub fn for_job(job: &Job) -> Self {
        Self {
            app_name: job.job_group_name.clone(),
            component: job.resource_name().unwrap_or_default().to_string(),
            instance: job.job_group_id.clone(),
            manifest_id: job
                .resource
                .as_ref()
                .map(|r| r.id.clone())
                .unwrap_or_default(),
        }
    }
}

/// Move an object into `namespace` and stamp the provenance annotations
pub fn annotate(object: &mut WorkloadObject, namespace: &str, provenance: &Provenance) {
    let metadata = object.metadata_mut();
    metadata.namespace = Some(namespace.to_string());

    let annotations = metadata.annotations.get_or_insert_with(Default::default);
    annotations.insert(ANNOTATION_APP_NAME.to_string(), provenance.app_name.clone());
    annotations.insert(ANNOTATION_COMPONENT.to_string(), provenance.component.clone());
    annotations.insert(ANNOTATION_INSTANCE.to_string(), provenance.instance.clone());
    annotations.insert(ANNOTATION_MANIFEST.to_string(), provenance.manifest_id.clone());
}

/// Manifest creating the job's namespace
pub fn namespace_manifest(namespace: &str) -> Result<Manifest, TranslateError> {
    if namespace.trim().is_empty() {
        return Err(TranslateError::MissingNamespace);
    }
    let object = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        ..Namespace::default()
    };
    Ok(Manifest(serde_json::to_value(&object)?))
}

/// Decode, relocate and annotate each manifest
///
/// A manifest that cannot be decoded, or whose kind is unsupported, is
/// dropped with a warning; the rest are still rendered.
pub fn render_manifests(
    manifests: &[PlainManifest],
    namespace: &str,
    provenance: &Provenance,
) -> Vec<Manifest> {
    let mut rendered = Vec::with_capacity(manifests.len());
    for manifest in manifests {
        let mut object = match WorkloadObject::from_yaml(&manifest.yaml_string) {
            Ok(object) => object,
            Err(e) => {
                warn!(manifest_id = manifest.id, error = %e, "Dropping manifest that failed to decode");
                continue;
            }
        };

        annotate(&mut object, namespace, provenance);
        debug!(manifest_id = manifest.id, kind = object.kind(), "Rendered manifest");

        match object.into_manifest() {
            Ok(m) => rendered.push(m),
            Err(e) => {
                warn!(manifest_id = manifest.id, error = %e, "Dropping manifest that failed to encode")
            }
        }
    }
    rendered
}

/// Full workload of a new bundle: the namespace first, then the job's manifests
pub fn render_bundle(
    namespace: &str,
    manifests: &[PlainManifest],
    provenance: &Provenance,
) -> Result<Vec<Manifest>, TranslateError> {
    let mut bundle = vec![namespace_manifest(namespace)?];
    bundle.extend(render_manifests(manifests, namespace, provenance));
    Ok(bundle)
}

/// Build the bundle submitted for a create job
///
/// The hub names it `<resource name>-<suffix>` in the target cluster's
/// namespace. Jobs that have not been deployed yet use the job group name.
pub fn generate_work(job: &Job) -> Result<ManifestWork, TranslateError> {
    let prefix = job.resource_name().unwrap_or(&job.job_group_name);
    let provenance = Provenance::for_job(job);
    let manifests = render_bundle(&job.namespace, &job.manifests, &provenance)?;

    Ok(ManifestWork {
        metadata: ObjectMeta {
            generate_name: Some(format!("{prefix}-")),
            namespace: Some(job.target.cluster_name.clone()),
            ..ObjectMeta::default()
        },
        spec: ManifestWorkSpec::with_manifests(manifests),
        status: None,
    })
}
