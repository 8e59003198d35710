//! Exact adversarial search
//!
//! Alpha-beta minimax over cloned positions, with random tie-breaking at the
//! root and an optional variant that materializes the explored tree.

pub mod search;
pub mod tree;

pub use search::{MinimaxConfig, MinimaxSearcher, evaluate};
pub use tree::SearchNode;
