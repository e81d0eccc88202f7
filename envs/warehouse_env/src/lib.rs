use async_trait::async_trait;
use depot_core::{
    register_environment_with_config, EngineError, Environment, Observation, Snapshot, ToolCall,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use std::sync::Arc;
use warehouse_rs::{Action, ActionOutcome, Layout, StandardLayout, WarehouseConfig, WarehouseEnv};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Floor plan: "standard" (default shelving), "open", or "seeded"
    /// (random interior walls derived from `seed`).
    pub layout: Option<String>,
    pub width: Option<usize>,
    pub height: Option<usize>,
    /// Interior wall count for the "seeded" layout.
    pub num_walls: Option<usize>,
    pub max_steps: Option<u32>,
    pub max_battery: Option<i32>,
    pub view_radius: Option<usize>,
    /// Re-sample robot/pickup/dropoff on every reset.
    pub randomize: Option<bool>,
    pub seed: Option<u64>,
    /// Optional explicit landmark overrides, as (row, col).
    pub start_pos: Option<(i32, i32)>,
    pub pickup_pos: Option<(i32, i32)>,
    pub dropoff_pos: Option<(i32, i32)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Some("standard".into()),
            width: None,
            height: None,
            num_walls: None,
            max_steps: None,
            max_battery: None,
            view_radius: None,
            randomize: Some(false),
            seed: Some(42),
            start_pos: None,
            pickup_pos: None,
            dropoff_pos: None,
        }
    }
}

fn make_env(cfg: &Config) -> Result<WarehouseEnv, EngineError> {
    let width = cfg.width.unwrap_or(10);
    let height = cfg.height.unwrap_or(10);
    let seed = cfg.seed.unwrap_or(42);
    let mut layout = match cfg.layout.as_deref() {
        Some("standard") | None => StandardLayout::build(),
        Some("open") => Layout::open(width, height),
        Some("seeded") => Layout::from_seed(width, height, cfg.num_walls.unwrap_or(8), seed),
        Some(other) => {
            return Err(EngineError::Validation(format!("unsupported layout: {other}")))
        }
    };
    if let Some(pos) = cfg.start_pos {
        layout.start_pos = pos;
    }
    if let Some(pos) = cfg.pickup_pos {
        layout.pickup_pos = pos;
    }
    if let Some(pos) = cfg.dropoff_pos {
        layout.dropoff_pos = pos;
    }

    let defaults = WarehouseConfig::default();
    let config = WarehouseConfig {
        max_steps: cfg.max_steps.unwrap_or(defaults.max_steps),
        max_battery: cfg.max_battery.unwrap_or(defaults.max_battery),
        view_radius: cfg.view_radius.unwrap_or(defaults.view_radius),
        seed,
        ..defaults
    };
    WarehouseEnv::new(layout, config).map_err(|e| EngineError::Validation(e.to_string()))
}

fn action_from_symbol(symbol: &str) -> Result<Action, EngineError> {
    Action::try_from(symbol)
        .map_err(|e| EngineError::Validation(format!("invalid action '{symbol}': {e}")))
}

pub struct WarehouseEnvironment {
    env: WarehouseEnv,
    randomize: bool,
    last_outcome: Option<ActionOutcome>,
}

impl WarehouseEnvironment {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let randomize = config.randomize.unwrap_or(false);
        Ok(Self { env: make_env(&config)?, randomize, last_outcome: None })
    }

    fn snapshot_obs(&self, event: &str) -> Observation {
        let obs = self.env.observe();
        let data = json!({
            // Stable observation schema consumed by drivers and loggers.
            "robot_pos": [obs.robot_pos.0, obs.robot_pos.1],
            "has_item": obs.has_item,
            "pickup_pos": [obs.pickup_pos.0, obs.pickup_pos.1],
            "dropoff_pos": [obs.dropoff_pos.0, obs.dropoff_pos.1],
            "battery": obs.battery,
            "steps": obs.steps,
            "local_grid": obs.local_rows(),
            // Auxiliary fields for visualization and reward accounting.
            "grid": self.env.render_grid(),
            "reward_last": self.env.reward_last(),
            "total_reward": self.env.total_reward(),
            "last_outcome": self.last_outcome,
            "event": event,
        });
        Observation { terminated: self.env.terminated(), truncated: self.env.truncated(), data }
    }

    fn apply(&mut self, symbol: &str) -> Result<(), EngineError> {
        let action = action_from_symbol(symbol)?;
        let out = self.env.step(action);
        self.last_outcome = Some(out.outcome);
        Ok(())
    }
}

#[async_trait]
impl Environment for WarehouseEnvironment {
    async fn initialize(&mut self) -> Result<Observation, EngineError> {
        self.env.reset(self.randomize);
        self.last_outcome = None;
        Ok(self.snapshot_obs("initialize"))
    }

    async fn step(&mut self, tool_calls: Vec<ToolCall>) -> Result<Observation, EngineError> {
        if tool_calls.is_empty() {
            return Err(EngineError::Validation("no tool_calls provided".into()));
        }
        let call = &tool_calls[0];
        if call.tool != "interact" {
            return Err(EngineError::Validation(format!("unknown tool: {}", call.tool)));
        }
        if let Some(symbol) = call.args.get("action").and_then(|v| v.as_str()) {
            self.apply(symbol)?;
        } else if let Some(arr) = call.args.get("actions").and_then(|v| v.as_array()) {
            for value in arr {
                let symbol = value.as_str().ok_or_else(|| {
                    EngineError::Validation("actions entries must be strings".into())
                })?;
                self.apply(symbol)?;
                if self.env.terminated() || self.env.truncated() {
                    break;
                }
            }
        } else {
            return Err(EngineError::Validation("missing 'action' or 'actions'".into()));
        }
        Ok(self.snapshot_obs("step"))
    }

    async fn checkpoint(&self) -> Result<Snapshot, EngineError> {
        let data = serde_json::to_value(&self.env)
            .map_err(|e| EngineError::Internal(format!("serialize engine state: {e}")))?;
        Ok(Snapshot { version: 1, engine: "warehouse".into(), data })
    }

    async fn terminate(&mut self) -> Result<Observation, EngineError> {
        let mut obs = self.snapshot_obs("terminate");
        obs.truncated = true;
        if let Some(map) = obs.data.as_object_mut() {
            map.insert("truncated".into(), Json::Bool(true));
        }
        Ok(obs)
    }
}

/// Registry hook so services can construct this environment by name.
pub fn register_default_env() {
    register_environment_with_config(
        "Warehouse",
        Arc::new(|cfg| {
            let cfg: Config = match cfg {
                Some(v) => serde_json::from_value(v)
                    .map_err(|e| EngineError::Validation(format!("bad config: {e}")))?,
                None => Config::default(),
            };
            Ok(Box::new(WarehouseEnvironment::new(cfg)?))
        }),
    );
}
