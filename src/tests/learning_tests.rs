use std::fs;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::blackjack::{states, Action, State};
use crate::learning::{learning_rate, Agent};

#[test]
fn learning_rate_schedule() {
    assert_eq!(learning_rate(1), 1.0);
    assert_eq!(learning_rate(11), 0.5);
    assert!(learning_rate(1000) < 0.02);
}

#[test]
fn fresh_agent_covers_the_state_space() {
    let agent = Agent::new();
    assert_eq!(agent.mc_values.len(), 420);
    assert_eq!(agent.q_values.len(), 420);
    for state in states() {
        assert_eq!(agent.mc_values[&state], 0.0);
        assert_eq!(agent.mc_visits[&state], 0);
        assert_eq!(agent.q_values[&state], [0.0, 0.0]);
    }
}

#[test]
fn default_policy_hits_below_14() {
    let low = State {
        hand: 13,
        ace: false,
        dealer: 6,
    };
    assert_eq!(Agent::default_policy(low), Action::Hit);
    let high = State {
        hand: 14,
        ace: false,
        dealer: 6,
    };
    assert_eq!(Agent::default_policy(high), Action::Stand);
    // A soft 15 counts the ace as 11, putting the total at the threshold.
    let soft = State {
        hand: 5,
        ace: true,
        dealer: 6,
    };
    assert_eq!(Agent::default_policy(soft), Action::Stand);
}

#[test]
fn monte_carlo_values_are_return_averages() {
    let mut rng = SmallRng::seed_from_u64(10);
    let mut agent = Agent::new();
    agent.run_monte_carlo(2000, &mut rng);
    let mut visited = 0;
    for state in states() {
        let visits = agent.mc_visits[&state];
        if visits > 0 {
            visited += 1;
            let mean = agent.mc_return_sums[&state] / visits as f64;
            assert_eq!(agent.mc_values[&state], mean, "{}", state);
            assert!(agent.mc_values[&state].abs() <= 1.0 + 1e-9, "{}", state);
        } else {
            assert_eq!(agent.mc_values[&state], 0.0);
        }
    }
    assert!(visited > 50);
}

#[test]
fn td_values_stay_bounded() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut agent = Agent::new();
    agent.run_temporal_difference(2000, &mut rng);
    for state in states() {
        assert!(agent.td_values[&state].abs() <= 20.0, "{}", state);
    }
    // A hard 20 against a dealer ace still stands and usually wins or
    // pushes, so its value should not end up strongly negative.
    let strong = State {
        hand: 20,
        ace: false,
        dealer: 1,
    };
    assert!(agent.td_visits[&strong] > 0);
}

#[test]
fn greedy_action_prefers_larger_q_and_ties_hit() {
    let mut agent = Agent::new();
    let state = State {
        hand: 16,
        ace: false,
        dealer: 10,
    };
    assert_eq!(agent.greedy_action(state), Action::Hit);
    agent.q_values.insert(state, [0.1, 0.4]);
    assert_eq!(agent.greedy_action(state), Action::Stand);
    agent.q_values.insert(state, [0.4, 0.4]);
    assert_eq!(agent.greedy_action(state), Action::Hit);
}

#[test]
fn q_learning_visits_match_updates() {
    let mut rng = SmallRng::seed_from_u64(12);
    let mut agent = Agent::new();
    agent.run_q_learning(2000, 0.4, &mut rng);
    for state in states() {
        if agent.q_visits[&state] == 0 {
            assert_eq!(agent.q_values[&state], [0.0, 0.0], "{}", state);
        }
    }
    let total_visits: u32 = states().map(|state| agent.q_visits[&state]).sum();
    assert!(total_visits >= 2000);
}

#[test]
fn checkpoint_round_trips() {
    let mut rng = SmallRng::seed_from_u64(13);
    let mut agent = Agent::new();
    agent.run_monte_carlo(500, &mut rng);
    agent.run_temporal_difference(500, &mut rng);
    agent.run_q_learning(500, 0.4, &mut rng);

    let path = std::env::temp_dir().join("tilemax_checkpoint_test.txt");
    agent.save(&path).unwrap();
    let loaded = Agent::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded.mc_values, agent.mc_values);
    assert_eq!(loaded.td_values, agent.td_values);
    assert_eq!(loaded.q_values, agent.q_values);
    assert_eq!(loaded.mc_return_sums, agent.mc_return_sums);
    assert_eq!(loaded.mc_visits, agent.mc_visits);
    assert_eq!(loaded.td_visits, agent.td_visits);
    assert_eq!(loaded.q_visits, agent.q_visits);
}

#[test]
fn loading_garbage_fails_with_invalid_data() {
    let path = std::env::temp_dir().join("tilemax_garbage_test.txt");
    fs::write(&path, "not a checkpoint\n\nstill not one").unwrap();
    let err = Agent::load(&path).unwrap_err();
    fs::remove_file(&path).unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
