use serde::{Deserialize, Serialize};

use crate::grid::{Layout, LayoutError, Pos, StandardLayout};
use crate::observation::{local_window, Observation};
use crate::rng::LcgRng;

/// Movement direction in (row, col) space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir {
    North,
    South,
    East,
    West,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::North, Dir::South, Dir::East, Dir::West];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::North => (-1, 0),
            Dir::South => (1, 0),
            Dir::East => (0, 1),
            Dir::West => (0, -1),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Dir::North => "N",
            Dir::South => "S",
            Dir::East => "E",
            Dir::West => "W",
        }
    }
}

/// Closed action vocabulary: {N, S, E, W, WAIT, PICK, DROP}.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Dir),
    Wait,
    Pick,
    Drop,
}

impl Action {
    pub fn symbol(self) -> &'static str {
        match self {
            Action::Move(d) => d.symbol(),
            Action::Wait => "WAIT",
            Action::Pick => "PICK",
            Action::Drop => "DROP",
        }
    }
}

/// Unknown symbols are a usage error, unlike a blocked move which is absorbed.
impl TryFrom<&str> for Action {
    type Error = &'static str;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Ok(match s {
            "N" => Action::Move(Dir::North),
            "S" => Action::Move(Dir::South),
            "E" => Action::Move(Dir::East),
            "W" => Action::Move(Dir::West),
            "WAIT" => Action::Wait,
            "PICK" => Action::Pick,
            "DROP" => Action::Drop,
            _ => return Err("invalid action symbol (expected N/S/E/W/WAIT/PICK/DROP)"),
        })
    }
}

/// What a step actually did to the state. `Blocked` is a move absorbed by a
/// wall; `NoOp` covers unsatisfied PICK/DROP preconditions and steps taken
/// after the episode already ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Moved,
    Blocked,
    Picked,
    Dropped,
    Waited,
    NoOp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub terminated: bool,
    pub truncated: bool,
    pub outcome: ActionOutcome,
    pub reward: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub max_steps: u32,
    pub max_battery: i32,
    /// Battery drained by a movement action.
    pub move_cost: i32,
    /// Battery drained by WAIT/PICK/DROP; movement costs more.
    pub idle_cost: i32,
    /// Local window half-width; the window side is 2 * view_radius + 1.
    pub view_radius: usize,
    pub step_penalty: f64,
    pub pick_reward: f64,
    pub drop_reward: f64,
    pub seed: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            max_battery: 100,
            move_cost: 2,
            idle_cost: 1,
            view_radius: 2,
            step_penalty: -0.1,
            pick_reward: 5.0,
            drop_reward: 20.0,
            seed: 42,
        }
    }
}

/// The grid-world environment: sole owner and mutator of episode state.
/// States are ACTIVE / TERMINATED / TRUNCATED; the latter two absorb all
/// steps until the next `reset`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarehouseEnv {
    layout: Layout,
    config: WarehouseConfig,
    robot_pos: Pos,
    pickup_pos: Pos,
    dropoff_pos: Pos,
    has_item: bool,
    battery: i32,
    steps: u32,
    terminated: bool,
    truncated: bool,
    reward_last: f64,
    total_reward: f64,
    rng: LcgRng,
}

impl WarehouseEnv {
    pub fn new(layout: Layout, config: WarehouseConfig) -> Result<Self, LayoutError> {
        layout.validate()?;
        let rng = LcgRng::new(config.seed);
        let mut env = Self {
            robot_pos: layout.start_pos,
            pickup_pos: layout.pickup_pos,
            dropoff_pos: layout.dropoff_pos,
            layout,
            config,
            has_item: false,
            battery: 0,
            steps: 0,
            terminated: false,
            truncated: false,
            reward_last: 0.0,
            total_reward: 0.0,
            rng,
        };
        env.reset(false);
        Ok(env)
    }

    /// Default 10x10 warehouse with the standard shelving layout.
    pub fn standard() -> Self {
        Self::new(StandardLayout::build(), WarehouseConfig::default())
            .expect("standard layout is valid")
    }

    /// Re-initialize the episode. With `randomize`, robot/pickup/dropoff are
    /// re-sampled from distinct floor cells via the owned RNG; otherwise the
    /// layout defaults apply, so back-to-back non-randomized resets observe
    /// identically.
    pub fn reset(&mut self, randomize: bool) -> Observation {
        if randomize {
            let mut floor = self.layout.grid.floor_cells();
            debug_assert!(floor.len() >= 3, "validated layouts have three floor cells");
            let i = self.rng.gen_index(floor.len());
            self.robot_pos = floor.swap_remove(i);
            let i = self.rng.gen_index(floor.len());
            self.pickup_pos = floor.swap_remove(i);
            let i = self.rng.gen_index(floor.len());
            self.dropoff_pos = floor.swap_remove(i);
        } else {
            self.robot_pos = self.layout.start_pos;
            self.pickup_pos = self.layout.pickup_pos;
            self.dropoff_pos = self.layout.dropoff_pos;
        }
        self.has_item = false;
        self.battery = self.config.max_battery;
        self.steps = 0;
        self.terminated = false;
        self.truncated = false;
        self.reward_last = 0.0;
        self.total_reward = 0.0;
        self.observe()
    }

    /// Advance one turn. Moves into walls are absorbed as `Blocked` (step
    /// cost still applies); PICK/DROP outside their preconditions are no-ops.
    /// A successful DROP at the dropoff terminates; battery or step budget
    /// exhaustion truncates, with termination winning in the same step.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if self.terminated || self.truncated {
            return StepOutcome {
                terminated: self.terminated,
                truncated: self.truncated,
                outcome: ActionOutcome::NoOp,
                reward: 0.0,
            };
        }

        self.steps += 1;
        let mut reward = self.config.step_penalty;
        let cost = match action {
            Action::Move(_) => self.config.move_cost,
            _ => self.config.idle_cost,
        };

        let outcome = match action {
            Action::Move(dir) => {
                let (dr, dc) = dir.delta();
                let next = (self.robot_pos.0 + dr, self.robot_pos.1 + dc);
                if self.layout.grid.is_wall(next.0, next.1) {
                    ActionOutcome::Blocked
                } else {
                    self.robot_pos = next;
                    ActionOutcome::Moved
                }
            }
            Action::Wait => ActionOutcome::Waited,
            Action::Pick => {
                if self.robot_pos == self.pickup_pos && !self.has_item {
                    self.has_item = true;
                    reward += self.config.pick_reward;
                    ActionOutcome::Picked
                } else {
                    ActionOutcome::NoOp
                }
            }
            Action::Drop => {
                if self.robot_pos == self.dropoff_pos && self.has_item {
                    self.has_item = false;
                    reward += self.config.drop_reward;
                    self.terminated = true;
                    ActionOutcome::Dropped
                } else {
                    ActionOutcome::NoOp
                }
            }
        };

        self.battery = (self.battery - cost).max(0);
        if !self.terminated && (self.battery == 0 || self.steps >= self.config.max_steps) {
            self.truncated = true;
        }
        self.reward_last = reward;
        self.total_reward += reward;

        debug_assert!(!self.layout.grid.is_wall(self.robot_pos.0, self.robot_pos.1));
        debug_assert!(self.battery >= 0 && self.battery <= self.config.max_battery);

        StepOutcome { terminated: self.terminated, truncated: self.truncated, outcome, reward }
    }

    /// Fresh read-only snapshot of the state a policy is allowed to see.
    pub fn observe(&self) -> Observation {
        Observation {
            robot_pos: self.robot_pos,
            has_item: self.has_item,
            pickup_pos: self.pickup_pos,
            dropoff_pos: self.dropoff_pos,
            battery: self.battery,
            steps: self.steps,
            local_grid: local_window(&self.layout.grid, self.robot_pos, self.config.view_radius),
        }
    }

    /// Full-grid text rows with landmark overlays for external visualization.
    /// Glyphs are stable: `#` wall, `.` floor, `P` pickup, `D` dropoff,
    /// `R` robot (robot wins when cells coincide).
    pub fn render_grid(&self) -> Vec<String> {
        let mut rows = self.layout.grid.rows();
        let mut put = |pos: Pos, glyph: char| {
            let (row, col) = (pos.0 as usize, pos.1 as usize);
            let line = &mut rows[row];
            let mut chars: Vec<char> = line.chars().collect();
            chars[col] = glyph;
            *line = chars.into_iter().collect();
        };
        put(self.pickup_pos, 'P');
        put(self.dropoff_pos, 'D');
        put(self.robot_pos, 'R');
        rows
    }

    /// Rendered grid plus a legend and episode counters, for console demos.
    pub fn render_with_legend(&self) -> String {
        let mut out = self.render_grid().join("\n");
        out.push_str("\n\nR robot | P pickup | D dropoff | # wall\n");
        out.push_str(&format!(
            "battery {} | steps {} | carrying {}\n",
            self.battery, self.steps, self.has_item
        ));
        out
    }

    pub fn robot_pos(&self) -> Pos {
        self.robot_pos
    }
    pub fn pickup_pos(&self) -> Pos {
        self.pickup_pos
    }
    pub fn dropoff_pos(&self) -> Pos {
        self.dropoff_pos
    }
    pub fn has_item(&self) -> bool {
        self.has_item
    }
    pub fn battery(&self) -> i32 {
        self.battery
    }
    pub fn steps(&self) -> u32 {
        self.steps
    }
    pub fn terminated(&self) -> bool {
        self.terminated
    }
    pub fn truncated(&self) -> bool {
        self.truncated
    }
    pub fn reward_last(&self) -> f64 {
        self.reward_last
    }
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }
    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}
