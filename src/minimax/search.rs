use rand::{prelude::IndexedRandom, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    game::{GameOutcome, GameState, Move, Player},
    ports::MovePolicy,
    utils::build_rng,
};

/// Base score for a decided game; remaining depth is added so faster wins
/// (and slower losses) rank higher.
pub const WIN_SCORE: i32 = 10;

/// Search tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimaxConfig {
    /// Ply cap on boards other than 3×3, where exhaustive search is too
    /// expensive. Play on those boards is not guaranteed optimal.
    pub max_depth_large: usize,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self { max_depth_large: 4 }
    }
}

/// Static evaluation from `player`'s point of view.
///
/// `remaining_depth` is the ply budget left when the position was reached.
pub fn evaluate(state: &GameState, player: Player, remaining_depth: usize) -> i32 {
    let bonus = WIN_SCORE + remaining_depth as i32;
    match state.winner() {
        Some(GameOutcome::Win(winner)) if winner == player => bonus,
        Some(GameOutcome::Win(_)) => -bonus,
        _ => 0,
    }
}

/// Alpha-beta searcher. Equally scored root moves are drawn uniformly at
/// random, so repeated play is not predictable.
#[derive(Debug, Clone)]
pub struct MinimaxSearcher {
    config: MinimaxConfig,
    rng: StdRng,
}

impl MinimaxSearcher {
    pub fn new() -> Self {
        Self::with_config(MinimaxConfig::default())
    }

    pub fn with_config(config: MinimaxConfig) -> Self {
        Self {
            config,
            rng: build_rng(None),
        }
    }

    /// Fix the tie-break stream for reproducible play.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    /// Ply budget for a search from `state`.
    ///
    /// Exhaustive on the standard board; capped by
    /// [`MinimaxConfig::max_depth_large`] elsewhere.
    pub fn search_depth(&self, state: &GameState) -> usize {
        let empty = state.empty_count();
        if state.is_standard() {
            empty
        } else {
            empty.min(self.config.max_depth_large)
        }
    }

    /// Score every legal root move for the player to move, in row-major
    /// order. Empty when the game is already over.
    pub fn score_moves(&self, state: &GameState) -> Vec<(Move, i32)> {
        if state.is_terminal() {
            return Vec::new();
        }
        let player = state.to_move();
        let depth = self.search_depth(state);

        state
            .legal_moves()
            .into_iter()
            .filter_map(|mv| {
                let next = state.after_move(mv)?;
                let score = alpha_beta(
                    &next,
                    depth.saturating_sub(1),
                    i32::MIN,
                    i32::MAX,
                    false,
                    player,
                );
                Some((mv, score))
            })
            .collect()
    }

    /// Best move for the player to move; `None` when the game is over or
    /// the board is full.
    pub fn best_move(&mut self, state: &GameState) -> Option<Move> {
        let scored = self.score_moves(state);
        self.pick_best(&scored)
    }

    /// Draw uniformly among the moves sharing the highest score.
    pub(super) fn pick_best(&mut self, scored: &[(Move, i32)]) -> Option<Move> {
        let best = scored.iter().map(|&(_, score)| score).max()?;
        let tied: Vec<Move> = scored
            .iter()
            .filter(|&&(_, score)| score == best)
            .map(|&(mv, _)| mv)
            .collect();
        tied.choose(&mut self.rng).copied()
    }
}

impl Default for MinimaxSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MovePolicy for MinimaxSearcher {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        self.best_move(state)
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}

/// Alpha-beta over clones of `state`, scored for `player`.
pub(crate) fn alpha_beta(
    state: &GameState,
    depth: usize,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    player: Player,
) -> i32 {
    if depth == 0 || state.is_terminal() {
        return evaluate(state, player, depth);
    }

    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for mv in state.legal_moves() {
        let Some(next) = state.after_move(mv) else {
            continue;
        };
        let score = alpha_beta(&next, depth - 1, alpha, beta, !maximizing, player);
        if maximizing {
            best = best.max(score);
            alpha = alpha.max(score);
        } else {
            best = best.min(score);
            beta = beta.min(score);
        }
        if beta <= alpha {
            break;
        }
    }
    best
}
