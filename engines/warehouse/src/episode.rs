use serde::{Deserialize, Serialize};

use crate::env::WarehouseEnv;
use crate::policy::Policy;

/// Outcome of a single reset-to-done rollout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub total_reward: f64,
    pub steps: u32,
    pub terminated: bool,
    pub truncated: bool,
    pub final_battery: i32,
}

/// Aggregates over a batch of rollouts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub episodes: usize,
    pub success_rate: f64,
    pub successes: Vec<bool>,
    pub episode_lengths: Vec<u32>,
    pub final_batteries: Vec<i32>,
    pub total_rewards: Vec<f64>,
}

/// Reset the environment and drive it with `policy` until it terminates,
/// truncates, or `step_limit` decisions have been taken (a safety ceiling on
/// top of the environment's own budgets).
pub fn run_episode(
    env: &mut WarehouseEnv,
    policy: &mut dyn Policy,
    randomize: bool,
    step_limit: u32,
) -> EpisodeStats {
    let mut obs = env.reset(randomize);
    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut terminated = false;
    let mut truncated = false;
    while steps < step_limit {
        let action = policy.decide(&obs);
        let out = env.step(action);
        total_reward += out.reward;
        steps += 1;
        terminated = out.terminated;
        truncated = out.truncated;
        if terminated || truncated {
            break;
        }
        obs = env.observe();
    }
    EpisodeStats { total_reward, steps, terminated, truncated, final_battery: env.battery() }
}

/// Run `n` rollouts, building a fresh policy per episode so histories do not
/// leak between runs. The factory receives the episode index for seeding.
pub fn run_episodes(
    env: &mut WarehouseEnv,
    make_policy: &mut dyn FnMut(usize) -> Box<dyn Policy>,
    n: usize,
    randomize: bool,
    step_limit: u32,
) -> AggregateStats {
    let mut successes = Vec::with_capacity(n);
    let mut episode_lengths = Vec::with_capacity(n);
    let mut final_batteries = Vec::with_capacity(n);
    let mut total_rewards = Vec::with_capacity(n);
    for episode in 0..n {
        let mut policy = make_policy(episode);
        let stats = run_episode(env, policy.as_mut(), randomize, step_limit);
        successes.push(stats.terminated);
        episode_lengths.push(stats.steps);
        final_batteries.push(stats.final_battery);
        total_rewards.push(stats.total_reward);
    }
    let wins = successes.iter().filter(|&&s| s).count();
    AggregateStats {
        episodes: n,
        success_rate: wins as f64 / n.max(1) as f64,
        successes,
        episode_lengths,
        final_batteries,
        total_rewards,
    }
}
