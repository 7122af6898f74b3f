//! The tile-merging puzzle game: board representation, slide-and-merge moves
//! with scoring, and the mutable simulator the search probes and restores.

use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::str::FromStr;
use std::{fmt, fmt::Write};

use arrayvec::ArrayVec;
use rand::seq::SliceRandom;
use rand::Rng;

pub const BOARD_SIZE: usize = 4;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// One cell on the board, numbered 0..16 in row-major order.
#[derive(Clone, Copy, Default, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Square(pub u8);

impl Square {
    pub fn from_row_col(row: usize, col: usize) -> Self {
        debug_assert!(row < BOARD_SIZE && col < BOARD_SIZE);
        Square((row * BOARD_SIZE + col) as u8)
    }

    pub fn row(self) -> usize {
        self.0 as usize / BOARD_SIZE
    }

    pub fn col(self) -> usize {
        self.0 as usize % BOARD_SIZE
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row(), self.col())
    }
}

pub fn squares_iterator() -> impl Iterator<Item = Square> {
    (0..NUM_SQUARES as u8).map(Square)
}

/// One of the four moves. The discriminant order is the order the search
/// enumerates moves in, which is also its tie-breaking order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Left = 1,
    Down = 2,
    Right = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Right,
    ];

    pub fn disc(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Left => write!(f, "left"),
            Direction::Down => write!(f, "down"),
            Direction::Right => write!(f, "right"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "up" => Ok(Direction::Up),
            "left" => Ok(Direction::Left),
            "down" => Ok(Direction::Down),
            "right" => Ok(Direction::Right),
            _ => Err(format!("Unknown direction \"{}\"", input)),
        }
    }
}

/// A 4x4 grid of tile values. 0 is an empty cell, every other value is a
/// power of two.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [u32; NUM_SQUARES],
}

impl Index<Square> for Board {
    type Output = u32;

    fn index(&self, square: Square) -> &u32 {
        &self.cells[square.0 as usize]
    }
}

impl IndexMut<Square> for Board {
    fn index_mut(&mut self, square: Square) -> &mut u32 {
        &mut self.cells[square.0 as usize]
    }
}

impl Board {
    pub const EMPTY: Board = Board {
        cells: [0; NUM_SQUARES],
    };

    pub fn from_rows(rows: [[u32; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        let mut board = Board::EMPTY;
        for (row, row_values) in rows.iter().enumerate() {
            for (col, value) in row_values.iter().enumerate() {
                board[Square::from_row_col(row, col)] = *value;
            }
        }
        board
    }

    pub fn empty_squares(&self) -> ArrayVec<Square, NUM_SQUARES> {
        squares_iterator()
            .filter(|square| self[*square] == 0)
            .collect()
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn tile_sum(&self) -> u32 {
        self.cells.iter().sum()
    }

    pub fn with_tile(mut self, square: Square, value: u32) -> Self {
        self[square] = value;
        self
    }

    /// Slide and merge all tiles in `direction`, returning the resulting
    /// board and the score gained from merges. The move was a no-op iff the
    /// result equals `self`.
    pub fn shift(&self, direction: Direction) -> (Board, u32) {
        let mut result = Board::EMPTY;
        let mut gained = 0;
        for lane in 0..BOARD_SIZE {
            let squares = lane_squares(direction, lane);
            let line = squares.map(|square| self[square]);
            let (merged, line_gained) = merge_line(line);
            gained += line_gained;
            for (i, square) in squares.iter().enumerate() {
                result[*square] = merged[i];
            }
        }
        (result, gained)
    }
}

/// The squares of one row or column, ordered from the edge the tiles slide
/// towards.
fn lane_squares(direction: Direction, lane: usize) -> [Square; BOARD_SIZE] {
    let mut squares = [Square::default(); BOARD_SIZE];
    for (i, square) in squares.iter_mut().enumerate() {
        *square = match direction {
            Direction::Left => Square::from_row_col(lane, i),
            Direction::Right => Square::from_row_col(lane, BOARD_SIZE - 1 - i),
            Direction::Up => Square::from_row_col(i, lane),
            Direction::Down => Square::from_row_col(BOARD_SIZE - 1 - i, lane),
        };
    }
    squares
}

/// Compact a line towards index 0, merging each pair of equal neighbours at
/// most once. Every merge scores the merged tile's value.
fn merge_line(line: [u32; BOARD_SIZE]) -> ([u32; BOARD_SIZE], u32) {
    let mut merged = [0; BOARD_SIZE];
    let mut gained = 0;
    let mut len = 0;
    let mut last_was_merge = false;
    for &tile in line.iter().filter(|&&tile| tile != 0) {
        if len > 0 && !last_was_merge && merged[len - 1] == tile {
            merged[len - 1] *= 2;
            gained += merged[len - 1];
            last_was_merge = true;
        } else {
            merged[len] = tile;
            len += 1;
            last_was_merge = false;
        }
    }
    (merged, gained)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                match self[Square::from_row_col(row, col)] {
                    0 => write!(f, "{:>6}", ".")?,
                    value => write!(f, "{:>6}", value)?,
                }
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        fmt::Display::fmt(self, f)
    }
}

/// A (board, score) snapshot. The score is monotonically non-decreasing over
/// real game transitions; the search stores a negative sentinel on no-op
/// branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub score: i64,
}

/// The mutable game simulator. The search treats it as a state-transition
/// oracle and restores it after every probe.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    score: i64,
}

impl Game {
    pub fn from_state(state: GameState) -> Self {
        Game {
            board: state.board,
            score: state.score,
        }
    }

    /// A fresh game with two spawned tiles and score 0.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut game = Game {
            board: Board::EMPTY,
            score: 0,
        };
        game.spawn_tile(rng);
        game.spawn_tile(rng);
        game
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board,
            score: self.score,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn reset(&mut self, state: GameState) {
        self.board = state.board;
        self.score = state.score;
    }

    /// Apply a move without spawning a tile. Returns false and leaves the
    /// state untouched if the move changes nothing.
    pub fn try_move(&mut self, direction: Direction) -> bool {
        let (board, gained) = self.board.shift(direction);
        if board == self.board {
            return false;
        }
        self.board = board;
        self.score += gained as i64;
        true
    }

    /// Apply a move as in the real game: slide, then spawn a tile if the
    /// board changed.
    pub fn make_move(&mut self, direction: Direction, rng: &mut impl Rng) -> bool {
        if self.try_move(direction) {
            self.spawn_tile(rng);
            true
        } else {
            false
        }
    }

    /// Spawn a 2 (90%) or a 4 (10%) on a uniformly random empty square.
    pub fn spawn_tile(&mut self, rng: &mut impl Rng) {
        if let Some(&square) = self.board.empty_squares().choose(rng) {
            let value = if rng.gen_range(0..10) == 0 { 4 } else { 2 };
            self.board[square] = value;
        }
    }

    pub fn open_squares(&self) -> ArrayVec<Square, NUM_SQUARES> {
        self.board.empty_squares()
    }

    pub fn place_tile(&mut self, square: Square, value: u32) {
        self.board[square] = value;
    }

    /// True when no direction changes the board.
    pub fn is_over(&self) -> bool {
        Direction::ALL
            .iter()
            .all(|&direction| self.board.shift(direction).0 == self.board)
    }

    /// Begin a scoped probe. The returned guard gives mutable access to the
    /// simulator and restores the current state when dropped, so a probed
    /// move cannot leak side effects, even on unwind.
    pub fn probe(&mut self) -> Probe<'_> {
        let saved = self.state();
        Probe { game: self, saved }
    }
}

pub struct Probe<'a> {
    game: &'a mut Game,
    saved: GameState,
}

impl Deref for Probe<'_> {
    type Target = Game;

    fn deref(&self) -> &Game {
        self.game
    }
}

impl DerefMut for Probe<'_> {
    fn deref_mut(&mut self) -> &mut Game {
        self.game
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        self.game.reset(self.saved);
    }
}
