//! Game-playing agents for two small games: an expectimax searcher for a
//! 4x4 tile-merging puzzle, and tabular reinforcement learning (Monte Carlo,
//! temporal difference and Q-learning) for a simplified blackjack.

extern crate arrayvec;
extern crate rand;

pub mod blackjack;
pub mod evaluation;
pub mod learning;
pub mod search;
pub mod tiles;

mod tests;
