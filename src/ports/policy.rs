//! Move policy port - the "best move" contract shared by every decision maker

use crate::game::{GameState, Move};

/// Unified move-query interface.
///
/// Implemented by the exact searcher, the MCTS engine, the rule cascade, the
/// random baselines and the learned Q-learning agent, so callers can swap
/// policies without knowing which one they hold.
///
/// # Examples
///
/// ```
/// use kinarow::{game::GameState, heuristic::HeuristicEngine, ports::MovePolicy};
///
/// let mut policy = HeuristicEngine::new();
/// let state = GameState::standard();
/// assert!(policy.select_move(&state).is_some());
/// ```
pub trait MovePolicy: Send {
    /// Choose a move for the player to move in `state`.
    ///
    /// Returns `None` when the position has no legal move (full board) or,
    /// for search-based policies, when the game is already decided. Callers
    /// must treat `None` as a valid outcome rather than an error.
    fn select_move(&mut self, state: &GameState) -> Option<Move>;

    /// Short name used in logs and reports.
    fn name(&self) -> &str;
}
