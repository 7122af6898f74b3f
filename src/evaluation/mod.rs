//! Static evaluation of tile-game states.

pub mod value_eval;

pub use value_eval::{extract_features, static_eval, ValueFeatures, ValueParams};
