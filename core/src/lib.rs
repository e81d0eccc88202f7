//! Core traits and types shared by Depot environments and their drivers.
//! An episode driver only needs `Environment` plus the wire types here
//! (ToolCall, Observation, Snapshot); concrete environments register a
//! factory so services can construct them by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::{Arc, Mutex};

/// Canonical tool call: tool name and JSON-serializable arguments.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Json,
}

/// Observation contract. Enforces presence of terminated/truncated;
/// environment-specific fields (robot_pos, battery, local_grid, ...) live in `data`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub terminated: bool,
    pub truncated: bool,
    #[serde(default)]
    pub data: Json,
}

/// Snapshot contract for checkpoint/restore.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub version: u32,
    pub engine: String,
    pub data: Json,
}

/// Environment errors mapped to HTTP responses by services.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Core async environment trait.
#[async_trait]
pub trait Environment: Send + Sync {
    async fn initialize(&mut self) -> Result<Observation, EngineError>;
    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError>;
    async fn checkpoint(&self) -> Result<Snapshot, EngineError>;
    async fn terminate(&mut self) -> Result<Observation, EngineError>;
}

// ---------------------------------
// Environment factory + registry
// ---------------------------------

/// Config-aware factory for constructing environment instances.
pub type EnvConfigFactory =
    Arc<dyn Fn(Option<Json>) -> Result<Box<dyn Environment>, EngineError> + Send + Sync + 'static>;

static ENV_REGISTRY: OnceLock<Mutex<HashMap<String, EnvConfigFactory>>> = OnceLock::new();

/// Register an environment factory that ignores config.
pub fn register_environment(
    name: &str,
    factory: Arc<dyn Fn() -> Box<dyn Environment> + Send + Sync + 'static>,
) {
    let f: EnvConfigFactory = Arc::new(move |_cfg: Option<Json>| Ok(factory())) as EnvConfigFactory;
    register_environment_with_config(name, f);
}

/// Register a config-aware environment factory under a unique name.
pub fn register_environment_with_config(name: &str, factory: EnvConfigFactory) {
    let mut reg = ENV_REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .expect("env registry poisoned");
    reg.insert(name.to_string(), factory);
}

/// Instantiate a registered environment by name with optional JSON config.
pub fn create_environment_with_config(
    name: &str,
    config: Option<Json>,
) -> Result<Box<dyn Environment>, EngineError> {
    let reg = ENV_REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|_| EngineError::Internal("env registry poisoned".into()))?;
    let f = reg
        .get(name)
        .ok_or_else(|| EngineError::NotFound(format!("unsupported environment: {name}")))?;
    f(config)
}

/// Instantiate a registered environment by name with no config.
pub fn create_environment(name: &str) -> Result<Box<dyn Environment>, EngineError> {
    create_environment_with_config(name, None)
}

/// List registered environment names.
pub fn list_environments() -> Vec<String> {
    ENV_REGISTRY
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map(|reg| reg.keys().cloned().collect())
        .unwrap_or_default()
}

// -----------------------
// Tests
// -----------------------
