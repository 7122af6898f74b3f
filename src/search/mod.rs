//! Expectimax search over an explicitly built game tree.
//!
//! The tree strictly alternates decision nodes, where the player picks one of
//! the four moves, and chance nodes, where the game places a new 2-tile on a
//! uniformly random empty square. The tree is built to a fixed depth first,
//! then backed up bottom-up: decision nodes take the maximum child value,
//! chance nodes the arithmetic mean.

use crate::evaluation;
use crate::tiles::{Direction, Game, GameState, Square};

/// Score stored on the terminal child of a move that does not change the
/// board, so that the backup discourages picking it.
pub const NO_OP_SCORE: i64 = -100;

const DEFAULT_DEPTH: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Decision,
    Chance,
}

/// The branch label leading to a child node: a move below a decision node, a
/// tile placement below a chance node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Shift(Direction),
    Place(Square),
}

/// A node of the game tree. Owns an immutable snapshot of the game state; a
/// node without children is terminal, either because the game cannot continue
/// or because the search depth was reached.
#[derive(Clone, Debug)]
pub struct Node {
    pub state: GameState,
    pub kind: NodeKind,
    pub children: Vec<(Action, Node)>,
}

impl Node {
    pub fn new(state: GameState, kind: NodeKind) -> Self {
        Node {
            state,
            kind,
            children: vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Which value a leaf reports back up the tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LeafEval {
    /// The raw accumulated game score.
    #[default]
    GameScore,
    /// The weighted feature evaluation from [`crate::evaluation`].
    Weighted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSetting {
    depth: u16,
    leaf_eval: LeafEval,
}

impl Default for SearchSetting {
    fn default() -> Self {
        SearchSetting {
            depth: DEFAULT_DEPTH,
            leaf_eval: LeafEval::GameScore,
        }
    }
}

impl SearchSetting {
    pub fn depth(mut self, depth: u16) -> Self {
        self.depth = depth;
        self
    }

    pub fn leaf_eval(mut self, leaf_eval: LeafEval) -> Self {
        self.leaf_eval = leaf_eval;
        self
    }
}

/// A fully built expectimax tree for one root state.
pub struct ExpectimaxTree {
    root: Node,
    settings: SearchSetting,
}

impl ExpectimaxTree {
    pub fn new(root_state: GameState) -> Self {
        Self::with_settings(root_state, SearchSetting::default())
    }

    pub fn with_settings(root_state: GameState, settings: SearchSetting) -> Self {
        let mut root = Node::new(root_state, NodeKind::Decision);
        let mut simulator = Game::from_state(root_state);
        expand(&mut simulator, &mut root, 0, settings.depth);
        ExpectimaxTree { root, settings }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Back up the tree and return the best move with its value. The move is
    /// `None` only when the tree was built with depth 0, leaving the root
    /// terminal. Does not mutate the tree, so repeated calls agree.
    pub fn best_move(&self) -> (Option<Direction>, f64) {
        match self.settings.leaf_eval {
            LeafEval::GameScore => evaluate(&self.root, &|state: &GameState| state.score as f64),
            LeafEval::Weighted => evaluate(&self.root, &evaluation::static_eval),
        }
    }
}

/// Build the full alternating tree below `node`, stopping at `max_depth`.
/// The simulator is reset before every branch and only mutated through scoped
/// probes, so no branch sees a sibling's side effects.
fn expand(simulator: &mut Game, node: &mut Node, depth: u16, max_depth: u16) {
    if depth == max_depth {
        return;
    }
    match node.kind {
        NodeKind::Decision => {
            for direction in Direction::ALL {
                simulator.reset(node.state);
                let shifted = {
                    let mut probe = simulator.probe();
                    probe.try_move(direction).then(|| probe.state())
                };
                match shifted {
                    Some(state) => {
                        let mut child = Node::new(state, NodeKind::Chance);
                        expand(simulator, &mut child, depth + 1, max_depth);
                        node.children.push((Action::Shift(direction), child));
                    }
                    None => {
                        // A no-op move gets a terminal child carrying the
                        // penalty score, and is not searched further.
                        let state = GameState {
                            board: node.state.board,
                            score: NO_OP_SCORE,
                        };
                        node.children
                            .push((Action::Shift(direction), Node::new(state, NodeKind::Chance)));
                    }
                }
            }
        }
        NodeKind::Chance => {
            for square in node.state.board.empty_squares() {
                let state = GameState {
                    board: node.state.board.with_tile(square, 2),
                    score: node.state.score,
                };
                let mut child = Node::new(state, NodeKind::Decision);
                expand(simulator, &mut child, depth + 1, max_depth);
                node.children.push((Action::Place(square), child));
            }
        }
    }
}

/// Recursive expectimax backup. Terminal nodes report `leaf_value`; decision
/// nodes take the maximum child value and remember its move; chance nodes
/// average their children uniformly. Ties break to the first-enumerated move.
pub fn evaluate<F>(node: &Node, leaf_value: &F) -> (Option<Direction>, f64)
where
    F: Fn(&GameState) -> f64,
{
    if node.is_terminal() {
        return (None, leaf_value(&node.state));
    }
    match node.kind {
        NodeKind::Decision => {
            let mut best_direction = None;
            let mut best_value = f64::NEG_INFINITY;
            for (action, child) in &node.children {
                let direction = match action {
                    Action::Shift(direction) => *direction,
                    Action::Place(_) => unreachable!("placement child under a decision node"),
                };
                let (_, value) = evaluate(child, leaf_value);
                if value > best_value {
                    best_value = value;
                    best_direction = Some(direction);
                }
            }
            (best_direction, best_value)
        }
        NodeKind::Chance => {
            // Chance nodes are only ever constructed with at least one
            // placement child; childless depth cutoffs take the terminal
            // branch above.
            let sum: f64 = node
                .children
                .iter()
                .map(|(_, child)| evaluate(child, leaf_value).1)
                .sum();
            (None, sum / node.children.len() as f64)
        }
    }
}

/// Build a tree of the given depth for `state` and return the expectimax
/// move, scoring leaves by raw game score.
pub fn expectimax(state: GameState, depth: u16) -> (Option<Direction>, f64) {
    ExpectimaxTree::with_settings(state, SearchSetting::default().depth(depth)).best_move()
}

/// Like [`expectimax`], but scores leaves with the weighted heuristic.
pub fn expectimax_heuristic(state: GameState, depth: u16) -> (Option<Direction>, f64) {
    ExpectimaxTree::with_settings(
        state,
        SearchSetting::default()
            .depth(depth)
            .leaf_eval(LeafEval::Weighted),
    )
    .best_move()
}
