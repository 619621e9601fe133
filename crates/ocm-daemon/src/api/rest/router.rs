//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Path prefix every route lives under
pub const BASE_PATH: &str = "/deploy-manager";

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let router = Router::new()
        // Health and status
        .route(BASE_PATH, get(handlers::home))
        .route(&route("/healthz"), get(handlers::healthz))
        .route(&route("/status"), get(handlers::daemon_status))
        // Jobs
        .route(&route("/execute"), get(handlers::execute_jobs))
        // Resources
        .route(&route("/resource"), get(handlers::get_resource))
        .route(&route("/resource/sync"), get(handlers::sync_resources))
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

fn route(path: &str) -> String {
    format!("{}{}", BASE_PATH, path)
}
