//! Search and learning engine for k-in-a-row board games
//!
//! This crate provides:
//! - An N×N board model with configurable win length and D4 canonicalization
//! - Exact minimax search with alpha-beta pruning and an inspectable search tree
//! - Monte Carlo tree search with heuristic rollouts
//! - A strategic rule cascade (win, block, fork, centre, corners)
//! - Tabular Q-learning over canonical states with a parallel curriculum trainer
//!
//! Every decision maker implements [`ports::MovePolicy`]:
//!
//! ```
//! use kinarow::{game::{GameState, Move}, minimax::MinimaxSearcher, ports::MovePolicy};
//!
//! let state = GameState::from_string("XX. / OO. / ...", 3).unwrap();
//! let mut searcher = MinimaxSearcher::new().with_seed(1);
//! assert_eq!(searcher.select_move(&state), Some(Move::new(0, 2)));
//! ```

pub mod cli;
pub mod error;
pub mod game;
pub mod heuristic;
pub mod mcts;
pub mod minimax;
pub mod observers;
pub mod ports;
pub mod q_learning;
pub mod training;
pub mod utils;

pub use error::{Error, Result};
pub use game::{GameOutcome, GameState, Move, Player};
pub use ports::{MovePolicy, TrainingObserver};
