//! Job execution handler

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::header::AUTHORIZATION, http::HeaderMap, Json};
use ocm_engine::control_plane::owner_id;
use ocm_types::Job;
use tracing::warn;

/// Pull executable jobs from the job manager and run them
///
/// Returns the jobs as they stand after the batch, including skipped and
/// failed ones.
pub async fn execute_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Job>>> {
    let authorization = forwarded_authorization(&headers);

    let owner = owner_id(state.plane.as_ref()).await.map_err(|e| {
        warn!(error = %e, "Error fetching cluster manager UID");
        ApiError::Internal(e.to_string())
    })?;
    let owner = owner.to_string();

    let mut jobs = state
        .job_manager
        .executable_jobs(&owner, authorization.as_deref())
        .await
        .map_err(|e| {
            warn!(error = %e, "Error getting executable jobs");
            ApiError::from(e)
        })?;

    let session = state.job_manager.session(authorization);
    state.executor.execute_batch(&mut jobs, &owner, &session).await;

    Ok(Json(jobs))
}

/// Inbound `Authorization` header, forwarded verbatim to the job manager
pub(crate) fn forwarded_authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
