//! k-in-a-row game model

pub mod state;
pub mod symmetry;

pub use state::{Cell, GameOutcome, GameState, Move, Player};
pub use symmetry::{CanonicalContext, D4Transform, StateKey};
