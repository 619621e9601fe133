//! Resource status handlers

use super::jobs::forwarded_authorization;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use ocm_types::Resource;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Query parameters for a single resource lookup
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResourceQuery {
    pub uid: String,
    pub resource_name: String,
    pub node_target: String,
}

/// Current status of one deployed bundle
pub async fn get_resource(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<Json<Resource>> {
    if query.uid.is_empty() || query.resource_name.is_empty() || query.node_target.is_empty() {
        warn!(
            uid = %query.uid,
            node_target = %query.node_target,
            resource_name = %query.resource_name,
            "Empty resource lookup parameter"
        );
        return Err(ApiError::BadRequest(
            "uid, node_target and resource_name are required".to_string(),
        ));
    }

    let work = state
        .plane
        .get_work(&query.node_target, &query.resource_name)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "ManifestWork {}/{}",
                query.node_target, query.resource_name
            ))
        })?;

    if work.uid() != query.uid {
        return Err(ApiError::BadRequest(
            "provided UID is different from the retrieved manifest".to_string(),
        ));
    }

    Ok(Json(Resource::observed(
        query.uid,
        query.resource_name,
        work.conditions().to_vec(),
    )))
}

/// Sync-up response
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// Resources found across the fleet
    pub resources: usize,
    /// Resources the job manager accepted
    pub pushed: usize,
    /// Resources whose push failed
    pub failed: usize,
}

/// Push the status of every bundle on every managed cluster to the job manager
pub async fn sync_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<SyncResponse>> {
    let authorization = forwarded_authorization(&headers);

    let resources = state.reconciler.sync_all().await.map_err(|e| {
        warn!(error = %e, "Error during resource sync");
        ApiError::Internal(e.to_string())
    })?;

    let mut pushed = 0;
    for resource in &resources {
        match state
            .job_manager
            .update_resource_status(resource, authorization.as_deref())
            .await
        {
            Ok(()) => pushed += 1,
            Err(e) => warn!(
                resource_uuid = %resource.resource_uuid,
                error = %e,
                "Error pushing resource status"
            ),
        }
    }

    info!(resources = resources.len(), pushed, "Resource sync-up complete");
    Ok(Json(SyncResponse {
        resources: resources.len(),
        pushed,
        failed: resources.len() - pushed,
    }))
}
