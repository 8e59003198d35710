//! Tabular Q-learning
//!
//! Values are keyed by the canonical form of a position (see
//! [`crate::game::StateKey`]), so all eight symmetric images of a board
//! share what is learned. Moves are carried into the canonical frame before
//! lookup and back out before play.
//!
//! ```no_run
//! use kinarow::{game::GameState, q_learning::QLearningAgent};
//!
//! let mut agent = QLearningAgent::default();
//! if let Err(err) = agent.load_snapshot("model.msgpack") {
//!     eprintln!("playing untrained: {err}");
//! }
//! let mv = agent.best_move(&GameState::standard());
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;

pub use agent::{
    ActionSelector, DEFAULT_DISCOUNT_FACTOR, DEFAULT_EPSILON, DEFAULT_LEARNING_RATE, QLearningAgent,
    TIE_TOLERANCE, episode_transitions,
};
pub use q_table::{QTable, Transition};
pub use serialization::{DEFAULT_TRAINING_METHOD, ModelMetadata, QEntry, SavedModel, SnapshotInfo};
