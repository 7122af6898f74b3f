use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::tiles::{squares_iterator, Board, Direction, Game, GameState, Square};

#[test]
fn squares_round_trip_rows_and_cols() {
    for square in squares_iterator() {
        assert_eq!(square, Square::from_row_col(square.row(), square.col()));
    }
    assert_eq!(Square::from_row_col(1, 2), Square(6));
    assert_eq!(format!("{}", Square(6)), "(1,2)");
}

#[test]
fn direction_from_str() {
    for direction in Direction::ALL {
        assert_eq!(format!("{}", direction).parse(), Ok(direction));
    }
    assert!("upp".parse::<Direction>().is_err());
    assert!("".parse::<Direction>().is_err());
}

#[test]
fn merge_each_pair_once() {
    let board = Board::from_rows([[2, 2, 4, 4], [0; 4], [0; 4], [0; 4]]);
    let (shifted, gained) = board.shift(Direction::Left);
    assert_eq!(
        shifted,
        Board::from_rows([[4, 8, 0, 0], [0; 4], [0; 4], [0; 4]]),
        "{:?}",
        shifted
    );
    assert_eq!(gained, 12);
}

#[test]
fn merged_tile_does_not_merge_again() {
    let board = Board::from_rows([[4, 2, 2, 0], [0; 4], [0; 4], [0; 4]]);
    let (shifted, gained) = board.shift(Direction::Left);
    assert_eq!(
        shifted,
        Board::from_rows([[4, 4, 0, 0], [0; 4], [0; 4], [0; 4]]),
        "{:?}",
        shifted
    );
    assert_eq!(gained, 4);
}

#[test]
fn triple_merges_towards_the_slide_edge() {
    let board = Board::from_rows([[2, 2, 2, 0], [0; 4], [0; 4], [0; 4]]);
    let (left, _) = board.shift(Direction::Left);
    assert_eq!(left, Board::from_rows([[4, 2, 0, 0], [0; 4], [0; 4], [0; 4]]));
    let (right, _) = board.shift(Direction::Right);
    assert_eq!(
        right,
        Board::from_rows([[0, 0, 2, 4], [0; 4], [0; 4], [0; 4]])
    );
}

#[test]
fn vertical_shift_orientation() {
    let board = Board::from_rows([[2, 0, 0, 0], [2, 0, 0, 0], [4, 0, 0, 0], [0; 4]]);
    let (up, gained) = board.shift(Direction::Up);
    assert_eq!(
        up,
        Board::from_rows([[4, 0, 0, 0], [4, 0, 0, 0], [0; 4], [0; 4]]),
        "{:?}",
        up
    );
    assert_eq!(gained, 4);
    let (down, _) = board.shift(Direction::Down);
    assert_eq!(
        down,
        Board::from_rows([[0; 4], [0; 4], [4, 0, 0, 0], [4, 0, 0, 0]]),
        "{:?}",
        down
    );
}

#[test]
fn shift_preserves_the_tile_sum() {
    let board = Board::from_rows([[2, 2, 4, 4], [0, 8, 8, 0], [2, 0, 0, 2], [0; 4]]);
    for direction in Direction::ALL {
        assert_eq!(board.shift(direction).0.tile_sum(), board.tile_sum());
    }
}

#[test]
fn no_op_move_is_rejected() {
    let state = GameState {
        board: Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]),
        score: 0,
    };
    let mut game = Game::from_state(state);
    assert!(!game.try_move(Direction::Up));
    assert!(!game.try_move(Direction::Left));
    assert_eq!(game.state(), state);
    assert!(game.try_move(Direction::Right));
    assert_ne!(game.state().board, state.board);
}

#[test]
fn score_accumulates_over_moves() {
    let state = GameState {
        board: Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [4, 4, 0, 0]]),
        score: 0,
    };
    let mut game = Game::from_state(state);
    assert!(game.try_move(Direction::Left));
    assert_eq!(game.score(), 12);
    assert!(game.try_move(Direction::Up));
    assert_eq!(game.score(), 12);
}

#[test]
fn probe_restores_on_drop() {
    let state = GameState {
        board: Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]),
        score: 100,
    };
    let mut game = Game::from_state(state);
    {
        let mut probe = game.probe();
        assert!(probe.try_move(Direction::Left));
        assert_eq!(probe.score(), 104);
        probe.place_tile(Square::from_row_col(3, 3), 2);
    }
    assert_eq!(game.state(), state);
}

#[test]
fn spawn_fills_an_empty_square_with_2_or_4() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..100 {
        let mut game = Game::from_state(GameState {
            board: Board::from_rows([[2, 4, 8, 16], [16, 8, 4, 0], [0; 4], [0; 4]]),
            score: 0,
        });
        let open_before = game.open_squares().len();
        game.spawn_tile(&mut rng);
        assert_eq!(game.open_squares().len(), open_before - 1);
        let spawned = squares_iterator()
            .map(|square| game.board()[square])
            .filter(|&value| value == 2 || value == 4)
            .count();
        assert_eq!(spawned, 4);
    }
}

#[test]
fn new_game_has_two_tiles_and_zero_score() {
    let mut rng = SmallRng::seed_from_u64(7);
    let game = Game::new(&mut rng);
    assert_eq!(game.open_squares().len(), 14);
    assert_eq!(game.score(), 0);
}

#[test]
fn game_over_detection() {
    let blocked = Board::from_rows([
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 2],
    ]);
    assert!(Game::from_state(GameState {
        board: blocked,
        score: 0
    })
    .is_over());

    let mergeable = blocked.with_tile(Square::from_row_col(0, 0), 4);
    assert!(!Game::from_state(GameState {
        board: mergeable,
        score: 0
    })
    .is_over());
}
