use std::cmp::Ordering;

use crate::tiles::{GameState, Square, BOARD_SIZE};

/// Weights over [`ValueFeatures`]. Several terms are carried at weight zero:
/// they were tried during tuning and kept so they can be re-enabled without
/// touching the feature extraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueParams {
    pub game_score: f64,
    pub tile_sum: f64,
    pub max_tile: f64,
    pub open_cells: f64,
    pub merge_pairs: f64,
    pub monotonicity: f64,
    pub corner_control: f64,
    pub smoothness: f64,
}

impl Default for ValueParams {
    fn default() -> Self {
        ValueParams {
            game_score: 2.0,
            tile_sum: 0.0,
            max_tile: 10.0,
            open_cells: 800.0,
            merge_pairs: 500.0,
            monotonicity: 0.0,
            corner_control: 0.0,
            smoothness: 0.0,
        }
    }
}

impl ValueParams {
    /// Weighted sum of the features. Monotonicity breaks and roughness are
    /// penalties and enter negatively.
    pub fn apply(&self, features: &ValueFeatures) -> f64 {
        self.game_score * features.game_score
            + self.tile_sum * features.tile_sum
            + self.max_tile * features.max_tile
            + self.open_cells * features.open_cells
            + self.merge_pairs * features.merge_pairs
            - self.monotonicity * features.monotonicity
            + self.corner_control * features.corner_control
            - self.smoothness * features.smoothness
    }
}

/// Feature counts extracted from a single scan of the board.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValueFeatures {
    pub game_score: f64,
    pub tile_sum: f64,
    pub max_tile: f64,
    pub open_cells: f64,
    /// Horizontally or vertically adjacent equal nonzero pairs, i.e. merges
    /// available to the next move.
    pub merge_pairs: f64,
    /// The smaller of the two directed monotonicity-break counts.
    pub monotonicity: f64,
    pub corner_control: f64,
    /// Sum of absolute value differences between adjacent cells.
    pub smoothness: f64,
}

/// Snake-ordered square weights, largest in the top-left corner.
const CORNER_WEIGHTS: [[f64; BOARD_SIZE]; BOARD_SIZE] = [
    [16.0, 15.0, 14.0, 13.0],
    [9.0, 10.0, 11.0, 12.0],
    [8.0, 7.0, 6.0, 5.0],
    [1.0, 2.0, 3.0, 4.0],
];

pub fn extract_features(state: &GameState) -> ValueFeatures {
    let board = &state.board;
    let mut features = ValueFeatures {
        game_score: state.score as f64,
        ..ValueFeatures::default()
    };
    let mut increasing = 0_u32;
    let mut decreasing = 0_u32;

    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let value = board[Square::from_row_col(row, col)];
            features.tile_sum += value as f64;
            features.max_tile = features.max_tile.max(value as f64);
            if value == 0 {
                features.open_cells += 1.0;
            }
            features.corner_control += CORNER_WEIGHTS[row][col] * value as f64;

            for neighbour in [
                (col > 0).then(|| board[Square::from_row_col(row, col - 1)]),
                (row > 0).then(|| board[Square::from_row_col(row - 1, col)]),
            ]
            .into_iter()
            .flatten()
            {
                if neighbour == value && value != 0 {
                    features.merge_pairs += 1.0;
                }
                match neighbour.cmp(&value) {
                    Ordering::Greater => decreasing += 1,
                    Ordering::Less => increasing += 1,
                    Ordering::Equal => (),
                }
                features.smoothness += (neighbour as f64 - value as f64).abs();
            }
        }
    }
    features.monotonicity = increasing.min(decreasing) as f64;
    features
}

/// Evaluate a state with the default weights.
pub fn static_eval(state: &GameState) -> f64 {
    ValueParams::default().apply(&extract_features(state))
}
