use std::io;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use tilemax::blackjack::{self, State};
use tilemax::learning::Agent;
use tilemax::search::{ExpectimaxTree, LeafEval, SearchSetting};
use tilemax::tiles::Game;

fn main() -> io::Result<()> {
    let matches = Command::new("tilemax")
        .version("0.1")
        .about("Expectimax tile-game agent and tabular blackjack learners")
        .arg(
            Arg::new("logfile")
                .short('l')
                .long("logfile")
                .env("LOGFILE")
                .value_name("tilemax.log")
                .help("Name of debug logfile")
                .global(true)
                .num_args(1),
        )
        .subcommand(
            Command::new("play")
                .about("Autoplay the tile game with expectimax")
                .arg(
                    Arg::new("depth")
                        .short('d')
                        .long("depth")
                        .help("Search depth of the game tree")
                        .num_args(1)
                        .default_value("3")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(
                    Arg::new("games")
                        .short('g')
                        .long("games")
                        .help("Number of games to play")
                        .num_args(1)
                        .default_value("1")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("heuristic")
                        .long("heuristic")
                        .help("Score leaves with the weighted evaluation instead of raw score")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the tile spawner")
                        .num_args(1)
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("train")
                .about("Train the blackjack learners and print the probe-state values")
                .arg(
                    Arg::new("episodes")
                        .short('n')
                        .long("episodes")
                        .help("Episodes per learning method")
                        .num_args(1)
                        .default_value("100000")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("method")
                        .short('m')
                        .long("method")
                        .help("Which learner to run")
                        .num_args(1)
                        .default_value("all")
                        .value_parser(["mc", "td", "q", "all"]),
                )
                .arg(
                    Arg::new("epsilon")
                        .short('e')
                        .long("epsilon")
                        .help("Exploration rate for Q-learning")
                        .num_args(1)
                        .default_value("0.4")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the card deck")
                        .num_args(1)
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("save")
                        .short('s')
                        .long("save")
                        .value_name("FILE")
                        .help("Write the learned tables to FILE")
                        .num_args(1),
                ),
        )
        .subcommand(
            Command::new("autoplay")
                .about("Play blackjack greedily from saved Q tables")
                .arg(
                    Arg::new("load")
                        .long("load")
                        .value_name("FILE")
                        .help("Checkpoint to load the tables from")
                        .num_args(1)
                        .required(true),
                )
                .arg(
                    Arg::new("hands")
                        .long("hands")
                        .help("Number of hands to play")
                        .num_args(1)
                        .default_value("1000")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the card deck")
                        .num_args(1)
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    init_logging(&matches)?;

    match matches.subcommand() {
        Some(("play", play_matches)) => play(play_matches),
        Some(("train", train_matches)) => train(train_matches),
        Some(("autoplay", autoplay_matches)) => autoplay(autoplay_matches),
        _ => unreachable!(),
    }
}

fn init_logging(matches: &ArgMatches) -> io::Result<()> {
    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    if let Some(log_file) = matches.get_one::<String>("logfile") {
        log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Debug)
                    .chain(fern::log_file(log_file)?),
            )
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Info)
                    .chain(io::stderr()),
            )
            .apply()
            .unwrap()
    } else {
        log_dispatcher
            .level(log::LevelFilter::Info)
            .chain(io::stderr())
            .apply()
            .unwrap()
    }
    Ok(())
}

fn rng_from_matches(matches: &ArgMatches) -> SmallRng {
    match matches.get_one::<u64>("seed") {
        Some(seed) => SmallRng::seed_from_u64(*seed),
        None => SmallRng::from_entropy(),
    }
}

fn play(matches: &ArgMatches) -> io::Result<()> {
    let depth = *matches.get_one::<u16>("depth").unwrap();
    let games = *matches.get_one::<u64>("games").unwrap();
    let leaf_eval = if matches.get_flag("heuristic") {
        LeafEval::Weighted
    } else {
        LeafEval::GameScore
    };
    let settings = SearchSetting::default().depth(depth).leaf_eval(leaf_eval);
    let mut rng = rng_from_matches(matches);

    for game_index in 0..games {
        let mut game = Game::new(&mut rng);
        let mut moves = 0_u64;
        loop {
            let (best_move, value) = ExpectimaxTree::with_settings(game.state(), settings)
                .best_move();
            let Some(direction) = best_move else {
                break;
            };
            if !game.make_move(direction, &mut rng) {
                break;
            }
            moves += 1;
            debug!(
                "Game {}: move {} {}, value {:.1}, score {}",
                game_index + 1,
                moves,
                direction,
                value,
                game.score()
            );
            if game.is_over() {
                break;
            }
        }
        info!(
            "Game {} over after {} moves, score {}, max tile {}",
            game_index + 1,
            moves,
            game.score(),
            game.board().max_tile()
        );
        println!(
            "Game {}: score {}, max tile {}",
            game_index + 1,
            game.score(),
            game.board().max_tile()
        );
    }
    Ok(())
}

/// Two reference states printed after training: a hard 10 and a hard 20
/// against a dealer ace.
const PROBE_STATES: [State; 2] = [
    State {
        hand: 10,
        ace: false,
        dealer: 1,
    },
    State {
        hand: 20,
        ace: false,
        dealer: 1,
    },
];

fn train(matches: &ArgMatches) -> io::Result<()> {
    let episodes = *matches.get_one::<usize>("episodes").unwrap();
    let method = matches.get_one::<String>("method").unwrap().as_str();
    let epsilon = *matches.get_one::<f64>("epsilon").unwrap();
    let mut rng = rng_from_matches(matches);

    let mut agent = Agent::new();
    if method == "mc" || method == "all" {
        info!("Running Monte Carlo for {} episodes", episodes);
        agent.run_monte_carlo(episodes, &mut rng);
        for state in PROBE_STATES {
            println!("MC value of {}: {:.4}", state, agent.mc_values[&state]);
        }
    }
    if method == "td" || method == "all" {
        info!("Running TD for {} episodes", episodes);
        agent.run_temporal_difference(episodes, &mut rng);
        for state in PROBE_STATES {
            println!("TD value of {}: {:.4}", state, agent.td_values[&state]);
        }
    }
    if method == "q" || method == "all" {
        info!("Running Q-learning for {} episodes", episodes);
        agent.run_q_learning(episodes, epsilon, &mut rng);
        for state in PROBE_STATES {
            let q = agent.q_values[&state];
            println!("Q values of {}: hit {:.4}, stand {:.4}", state, q[0], q[1]);
        }
    }

    if let Some(path) = matches.get_one::<String>("save") {
        agent.save(path)?;
        info!("Saved tables to {}", path);
    }
    Ok(())
}

fn autoplay(matches: &ArgMatches) -> io::Result<()> {
    let path = matches.get_one::<String>("load").unwrap();
    let hands = *matches.get_one::<usize>("hands").unwrap();
    let mut rng = rng_from_matches(matches);

    let agent = Agent::load(path)?;
    let mut wins = 0_usize;
    let mut draws = 0_usize;
    let mut losses = 0_usize;
    let mut game = blackjack::Game::deal(&mut rng);
    for _ in 0..hands {
        game.reset(&mut rng);
        let outcome = game
            .episode(|state| agent.greedy_action(state), &mut rng)
            .last()
            .map_or(0.0, |&(_, reward)| reward);
        if outcome > 0.0 {
            wins += 1;
        } else if outcome < 0.0 {
            losses += 1;
        } else {
            draws += 1;
        }
    }
    println!(
        "{} hands: {} wins, {} draws, {} losses",
        hands, wins, draws, losses
    );
    Ok(())
}
