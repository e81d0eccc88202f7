use std::collections::VecDeque;

use crate::env::{Action, Dir};
use crate::grid::Pos;
use crate::observation::Observation;
use crate::rng::LcgRng;

/// Single decision interface every policy implements; no capability probing.
/// `&mut self` covers internal bookkeeping (RNG, visit history) only;
/// policies never mutate the environment.
pub trait Policy {
    fn decide(&mut self, obs: &Observation) -> Action;
}

pub fn manhattan(a: Pos, b: Pos) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

/// Rule-priority reflex policy, a pure function of the current observation:
/// 1. at pickup without the item -> PICK
/// 2. at dropoff carrying -> DROP
/// 3. unblocked move reducing the row/col delta to the active target
/// 4. any unblocked move when every target-ward direction is walled off
/// 5. WAIT when boxed in
/// Ties break uniformly at random; seed the policy for reproducibility.
#[derive(Clone, Debug)]
pub struct ReflexPolicy {
    rng: LcgRng,
}

impl ReflexPolicy {
    pub fn new(seed: u64) -> Self {
        Self { rng: LcgRng::new(seed) }
    }

    fn toward_target(&mut self, obs: &Observation, target: Pos) -> Option<Dir> {
        let dr = target.0 - obs.robot_pos.0;
        let dc = target.1 - obs.robot_pos.1;
        if dr == 0 && dc == 0 {
            return None;
        }
        let mut primary = Vec::new();
        if dr < 0 && !obs.blocked(Dir::North) {
            primary.push(Dir::North);
        }
        if dr > 0 && !obs.blocked(Dir::South) {
            primary.push(Dir::South);
        }
        if dc < 0 && !obs.blocked(Dir::West) {
            primary.push(Dir::West);
        }
        if dc > 0 && !obs.blocked(Dir::East) {
            primary.push(Dir::East);
        }
        if let Some(d) = self.rng.choose(&primary) {
            return Some(*d);
        }
        // Sidestep: any open direction, even one that gains no ground.
        let secondary = obs.unblocked_dirs();
        self.rng.choose(&secondary).copied()
    }
}

impl Policy for ReflexPolicy {
    fn decide(&mut self, obs: &Observation) -> Action {
        if obs.robot_pos == obs.pickup_pos && !obs.has_item {
            return Action::Pick;
        }
        if obs.robot_pos == obs.dropoff_pos && obs.has_item {
            return Action::Drop;
        }
        let target = if obs.has_item { obs.dropoff_pos } else { obs.pickup_pos };
        if let Some(dir) = self.toward_target(obs, target) {
            return Action::Move(dir);
        }
        let moves = obs.unblocked_dirs();
        match self.rng.choose(&moves) {
            Some(dir) => Action::Move(*dir),
            None => Action::Wait,
        }
    }
}

/// Greedy Manhattan-distance policy with loop escape. Remembers the last
/// `history_len` visited positions; a revisit (checked before the current
/// position is recorded, so bouncing straight back triggers it) arms
/// `escape_steps` calls of random movement that ignore the goal.
#[derive(Clone, Debug)]
pub struct GreedyPolicy {
    rng: LcgRng,
    history: VecDeque<Pos>,
    history_len: usize,
    escape_duration: u32,
    escape_remaining: u32,
}

impl GreedyPolicy {
    pub fn new(seed: u64) -> Self {
        Self::with_params(seed, 10, 3)
    }

    pub fn with_params(seed: u64, history_len: usize, escape_steps: u32) -> Self {
        Self {
            rng: LcgRng::new(seed),
            history: VecDeque::with_capacity(history_len),
            history_len,
            escape_duration: escape_steps,
            escape_remaining: 0,
        }
    }

    /// Remaining escape-mode calls; zero outside escape mode.
    pub fn escape_remaining(&self) -> u32 {
        self.escape_remaining
    }

    fn remember(&mut self, pos: Pos) {
        while self.history.len() >= self.history_len.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(pos);
    }

    fn random_move(&mut self, obs: &Observation) -> Option<Action> {
        let moves = obs.unblocked_dirs();
        self.rng.choose(&moves).map(|d| Action::Move(*d))
    }
}

impl Policy for GreedyPolicy {
    fn decide(&mut self, obs: &Observation) -> Action {
        if self.history.contains(&obs.robot_pos) {
            self.escape_remaining = self.escape_duration;
        }
        self.remember(obs.robot_pos);

        if self.escape_remaining > 0 {
            self.escape_remaining -= 1;
            if let Some(action) = self.random_move(obs) {
                return action;
            }
            // Boxed in: fall through to the goal rules rather than stall.
        }

        if obs.robot_pos == obs.pickup_pos && !obs.has_item {
            return Action::Pick;
        }
        if obs.robot_pos == obs.dropoff_pos && obs.has_item {
            return Action::Drop;
        }

        let goal = if obs.has_item { obs.dropoff_pos } else { obs.pickup_pos };
        let current = manhattan(obs.robot_pos, goal);
        let mut best: Vec<Dir> = Vec::new();
        let mut best_dist = current;
        for dir in Dir::ALL {
            if obs.blocked(dir) {
                continue;
            }
            let (dr, dc) = dir.delta();
            let next = (obs.robot_pos.0 + dr, obs.robot_pos.1 + dc);
            let dist = manhattan(next, goal);
            if dist < best_dist {
                best_dist = dist;
                best = vec![dir];
            } else if dist == best_dist && dist < current {
                best.push(dir);
            }
        }
        if let Some(dir) = self.rng.choose(&best) {
            return Action::Move(*dir);
        }
        match self.random_move(obs) {
            Some(action) => action,
            None => Action::Wait,
        }
    }
}

/// Baseline: a uniformly random unblocked move, WAIT when boxed in.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    rng: LcgRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self { rng: LcgRng::new(seed) }
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, obs: &Observation) -> Action {
        let moves = obs.unblocked_dirs();
        match self.rng.choose(&moves) {
            Some(dir) => Action::Move(*dir),
            None => Action::Wait,
        }
    }
}
