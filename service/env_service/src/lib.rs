use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    sync::Arc,
};

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use depot_core::{
    create_environment_with_config, list_environments, EngineError, Environment, Observation,
    Snapshot, ToolCall,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
    // tokio's RwLock: the guard is held across environment await points.
    store: Arc<RwLock<HashMap<String, Box<dyn Environment>>>>,
    id_ctr: Arc<AtomicU64>,
}

impl AppState {
    fn new() -> Self {
        Self { store: Arc::new(RwLock::new(HashMap::new())), id_ctr: Arc::new(AtomicU64::new(1)) }
    }
    fn next_id(&self) -> String {
        format!("env-{}", self.id_ctr.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Deserialize)]
pub struct InitRequest {
    pub env_type: String,
    #[serde(default)]
    pub config: Option<JsonValue>,
}

#[derive(Serialize)]
pub struct InitResponse {
    pub env_id: String,
    pub observation: Observation,
}

#[derive(Deserialize)]
pub struct StepRequest {
    pub env_id: String,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
pub struct IdRequest {
    pub env_id: String,
}

async fn list_envs() -> impl IntoResponse {
    let mut names = list_environments();
    names.sort();
    Json(names)
}

#[axum::debug_handler]
async fn initialize(
    State(state): State<AppState>,
    Json(req): Json<InitRequest>,
) -> Result<Json<InitResponse>, (StatusCode, String)> {
    let mut env = create_environment_with_config(&req.env_type, req.config).map_err(map_engine_err)?;
    let obs = env.initialize().await.map_err(map_engine_err)?;
    let id = state.next_id();
    debug!(env_id = %id, env_type = %req.env_type, "environment created");
    state.store.write().await.insert(id.clone(), env);
    Ok(Json(InitResponse { env_id: id, observation: obs }))
}

#[axum::debug_handler]
async fn step(
    State(state): State<AppState>,
    Json(req): Json<StepRequest>,
) -> Result<Json<Observation>, (StatusCode, String)> {
    let mut guard = state.store.write().await;
    let env = guard
        .get_mut(&req.env_id)
        .ok_or((StatusCode::NOT_FOUND, format!("env {} not found", req.env_id)))?;
    let obs = env.step(req.tool_calls).await.map_err(map_engine_err)?;
    debug!(env_id = %req.env_id, terminated = obs.terminated, truncated = obs.truncated, "step");
    Ok(Json(obs))
}

#[axum::debug_handler]
async fn checkpoint(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    let guard = state.store.read().await;
    let env = guard
        .get(&req.env_id)
        .ok_or((StatusCode::NOT_FOUND, format!("env {} not found", req.env_id)))?;
    let snap = env.checkpoint().await.map_err(map_engine_err)?;
    Ok(Json(snap))
}

#[axum::debug_handler]
async fn terminate(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Observation>, (StatusCode, String)> {
    let mut guard = state.store.write().await;
    let mut env = guard
        .remove(&req.env_id)
        .ok_or((StatusCode::NOT_FOUND, format!("env {} not found", req.env_id)))?;
    let obs = env.terminate().await.map_err(map_engine_err)?;
    debug!(env_id = %req.env_id, "environment removed");
    Ok(Json(obs))
}

fn map_engine_err(err: EngineError) -> (StatusCode, String) {
    let status = match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        warn!(%err, "engine failure");
    }
    (status, err.to_string())
}

/// Register the built-in environments served by this process.
pub fn register_builtin_envs() {
    warehouse_env::register_default_env();
}

pub fn make_app() -> Router {
    let state = AppState::new();
    Router::new()
        .route("/envs", get(list_envs))
        .route("/initialize", post(initialize))
        .route("/step", post(step))
        .route("/checkpoint", post(checkpoint))
        .route("/terminate", post(terminate))
        .with_state(state)
}
