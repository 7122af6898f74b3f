//! Tabular reinforcement learning for the blackjack simulator: every-visit
//! Monte Carlo and TD(0) evaluation of a fixed policy, and Q-learning with an
//! epsilon-greedy behavior policy. The learned tables checkpoint to a flat
//! text format, see [`Agent::save`].

use std::collections::HashMap;

use log::debug;
use rand::Rng;

use crate::blackjack::{states, Action, Game, State};

mod tables;

/// Discount factor for all value estimates.
pub const DISCOUNT: f64 = 0.95;

/// The fixed learning-rate schedule for TD and Q-learning.
pub fn learning_rate(n: u32) -> f64 {
    10.0 / (9.0 + n as f64)
}

/// Episodes between progress log lines.
const LOG_INTERVAL: usize = 10_000;

/// The learned tables, all keyed by [`State`] and zero-initialized over the
/// full state space. The Monte Carlo value of a state is always its return
/// sum divided by its visit count.
#[derive(Debug)]
pub struct Agent {
    pub mc_values: HashMap<State, f64>,
    pub mc_return_sums: HashMap<State, f64>,
    pub mc_visits: HashMap<State, u32>,
    pub td_values: HashMap<State, f64>,
    pub td_visits: HashMap<State, u32>,
    pub q_values: HashMap<State, [f64; 2]>,
    pub q_visits: HashMap<State, u32>,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent {
    pub fn new() -> Self {
        let mut agent = Agent {
            mc_values: HashMap::new(),
            mc_return_sums: HashMap::new(),
            mc_visits: HashMap::new(),
            td_values: HashMap::new(),
            td_visits: HashMap::new(),
            q_values: HashMap::new(),
            q_visits: HashMap::new(),
        };
        for state in states() {
            agent.mc_values.insert(state, 0.0);
            agent.mc_return_sums.insert(state, 0.0);
            agent.mc_visits.insert(state, 0);
            agent.td_values.insert(state, 0.0);
            agent.td_visits.insert(state, 0);
            agent.q_values.insert(state, [0.0; 2]);
            agent.q_visits.insert(state, 0);
        }
        agent
    }

    /// The fixed policy Monte Carlo and TD evaluate: hit below a total of 14.
    pub fn default_policy(state: State) -> Action {
        if state.total() < 14 {
            Action::Hit
        } else {
            Action::Stand
        }
    }

    /// Every-visit Monte Carlo evaluation of the default policy.
    pub fn run_monte_carlo(&mut self, episodes: usize, rng: &mut impl Rng) {
        let mut game = Game::deal(rng);
        for episode_index in 0..episodes {
            log_progress("MC", episode_index, episodes);
            game.reset(rng);
            let steps = game.episode(Self::default_policy, rng);
            for (i, &(state, _)) in steps.iter().enumerate() {
                let discounted_return: f64 = steps[i..]
                    .iter()
                    .enumerate()
                    .map(|(offset, &(_, reward))| DISCOUNT.powi(offset as i32) * reward)
                    .sum();
                *self.mc_visits.entry(state).or_insert(0) += 1;
                *self.mc_return_sums.entry(state).or_insert(0.0) += discounted_return;
            }
        }
        for state in states() {
            let visits = self.mc_visits[&state];
            if visits > 0 {
                self.mc_values
                    .insert(state, self.mc_return_sums[&state] / visits as f64);
            }
        }
    }

    /// TD(0) evaluation of the default policy, with terminal values fixed
    /// at 0.
    pub fn run_temporal_difference(&mut self, episodes: usize, rng: &mut impl Rng) {
        let mut game = Game::deal(rng);
        for episode_index in 0..episodes {
            log_progress("TD", episode_index, episodes);
            game.reset(rng);
            let mut state = game.state();
            while let Some(current) = state {
                let action = Self::default_policy(current);
                let (reward, next) = game.step(action, rng);
                let next_value = next.map_or(0.0, |next_state| self.td_values[&next_state]);
                let visits = self.td_visits.entry(current).or_insert(0);
                *visits += 1;
                let alpha = learning_rate(*visits);
                let value = self.td_values.entry(current).or_insert(0.0);
                *value += alpha * (reward + DISCOUNT * next_value - *value);
                state = next;
            }
        }
    }

    /// Q-learning with an epsilon-greedy behavior policy.
    pub fn run_q_learning(&mut self, episodes: usize, epsilon: f64, rng: &mut impl Rng) {
        let mut game = Game::deal(rng);
        for episode_index in 0..episodes {
            log_progress("Q", episode_index, episodes);
            game.reset(rng);
            let mut state = game.state();
            while let Some(current) = state {
                let action = self.pick_action(current, epsilon, rng);
                let (reward, next) = game.step(action, rng);
                let next_best = next.map_or(0.0, |next_state| {
                    let q = self.q_values[&next_state];
                    q[0].max(q[1])
                });
                let visits = self.q_visits.entry(current).or_insert(0);
                *visits += 1;
                let alpha = learning_rate(*visits);
                let q = self.q_values.entry(current).or_insert([0.0; 2]);
                let entry = &mut q[action.disc()];
                *entry += alpha * (reward + DISCOUNT * next_best - *entry);
                state = next;
            }
        }
    }

    /// Epsilon-greedy action selection over the Q table.
    fn pick_action(&self, state: State, epsilon: f64, rng: &mut impl Rng) -> Action {
        if rng.gen::<f64>() < epsilon {
            if rng.gen::<bool>() {
                Action::Hit
            } else {
                Action::Stand
            }
        } else {
            self.greedy_action(state)
        }
    }

    /// The greedy play for a state. Ties go to hitting, which is also the
    /// play before any learning has happened.
    pub fn greedy_action(&self, state: State) -> Action {
        let q = self.q_values[&state];
        if q[Action::Stand.disc()] > q[Action::Hit.disc()] {
            Action::Stand
        } else {
            Action::Hit
        }
    }
}

fn log_progress(name: &str, episode_index: usize, episodes: usize) {
    if episode_index % LOG_INTERVAL == 0 || episode_index + 1 == episodes {
        debug!("{} episode {}/{}", name, episode_index + 1, episodes);
    }
}
