//! In-process job manager for tests

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use ocm_types::{Job, Resource};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Everything the fake job manager was sent
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub pulled_by: Vec<String>,
    pub authorization: Vec<Option<String>>,
    pub promoted: Vec<(String, String)>,
    /// (id query, orchestrator query, body)
    pub updated: Vec<(String, String, Job)>,
    pub resources: Vec<Resource>,
}

#[derive(Default)]
struct FakeState {
    jobs: Vec<Job>,
    recorded: Recorded,
    reject_promotions: bool,
    serve_garbage: bool,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeJobManager {
    addr: SocketAddr,
    state: Shared,
}

impl FakeJobManager {
    /// Serve `jobs` as the executable jobs of any owner
    pub async fn start(jobs: Vec<Job>) -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            jobs,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/jobmanager/jobs/executable/ocm/:owner", get(executable))
            .route("/jobmanager/jobs/promote/:id", patch(promote))
            .route("/jobmanager/jobs", put(update_job))
            .route("/jobmanager/resources/status", put(update_resource))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn recorded(&self) -> Recorded {
        self.state.lock().unwrap().recorded.clone()
    }

    pub fn reject_promotions(&self) {
        self.state.lock().unwrap().reject_promotions = true;
    }

    pub fn serve_garbage(&self) {
        self.state.lock().unwrap().serve_garbage = true;
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn executable(
    State(state): State<Shared>,
    Path(owner): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.recorded.pulled_by.push(owner);
    state.recorded.authorization.push(authorization(&headers));
    if state.serve_garbage {
        return "<html>not json</html>".into_response();
    }
    Json(state.jobs.clone()).into_response()
}

async fn promote(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.recorded.authorization.push(authorization(&headers));
    let owner = body["owner_id"].as_str().unwrap_or_default().to_string();
    state.recorded.promoted.push((id, owner));
    if state.reject_promotions {
        return (StatusCode::CONFLICT, "job already promoted").into_response();
    }
    StatusCode::OK.into_response()
}

async fn update_job(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(job): Json<Job>,
) -> StatusCode {
    let mut state = state.lock().unwrap();
    state.recorded.authorization.push(authorization(&headers));
    let id = query.get("id").cloned().unwrap_or_default();
    let orchestrator = query.get("orchestrator").cloned().unwrap_or_default();
    state.recorded.updated.push((id, orchestrator, job));
    StatusCode::OK
}

async fn update_resource(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(resource): Json<Resource>,
) -> StatusCode {
    let mut state = state.lock().unwrap();
    state.recorded.authorization.push(authorization(&headers));
    state.recorded.resources.push(resource);
    StatusCode::OK
}
