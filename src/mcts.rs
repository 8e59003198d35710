//! Monte Carlo Tree Search
//!
//! Arena-backed UCB1 search with a heuristic rollout policy. The tree is
//! built fresh for every move query and dropped afterwards.

pub mod node;
pub mod rollout;
pub mod tree;

use rand::{prelude::IndexedRandom, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use node::{MctsNode, NodeId};
pub use tree::MctsTree;

use crate::{
    game::{GameState, Move},
    ports::MovePolicy,
    utils::build_rng,
};

/// Search tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Requested iterations per move
    pub iterations: usize,
    /// UCB1 exploration constant
    pub exploration: f64,
    /// Cap the requested budget by the number of empty cells
    /// (see [`iteration_budget`])
    pub scale_budget: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            exploration: std::f64::consts::SQRT_2,
            scale_budget: true,
        }
    }
}

impl MctsConfig {
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }
}

/// Iteration cap by game phase: openings are cheap to judge, endgames get
/// the most samples.
pub fn iteration_budget(empty_cells: usize, requested: usize) -> usize {
    if empty_cells > 7 {
        requested.min(500)
    } else if empty_cells > 4 {
        requested.min(800)
    } else {
        requested.min(1500)
    }
}

#[derive(Debug, Clone)]
pub struct MctsEngine {
    config: MctsConfig,
    rng: StdRng,
}

impl MctsEngine {
    pub fn new(config: MctsConfig) -> Self {
        Self {
            config,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Move chosen with the configured budget.
    pub fn best_move(&mut self, state: &GameState) -> Option<Move> {
        let iterations = if self.config.scale_budget {
            iteration_budget(state.empty_count(), self.config.iterations)
        } else {
            self.config.iterations
        };
        self.search(state, iterations)
    }

    /// Move chosen after exactly `iterations` select/expand/simulate/backup
    /// rounds.
    ///
    /// Returns `None` for finished games. A single legal move is returned
    /// without searching. When the budget produced no root children the
    /// move is drawn uniformly at random.
    pub fn search(&mut self, state: &GameState, iterations: usize) -> Option<Move> {
        if state.is_terminal() {
            return None;
        }
        let legal = state.legal_moves();
        match legal.as_slice() {
            [] => return None,
            [only] => return Some(*only),
            _ => {}
        }

        let tree = self.build_tree(state, iterations);
        tree.most_visited_move()
            .or_else(|| legal.choose(&mut self.rng).copied())
    }

    /// Run the search and hand back the whole tree.
    pub fn build_tree(&mut self, state: &GameState, iterations: usize) -> MctsTree {
        let mut tree = MctsTree::new(state.clone());
        let root_player = state.to_move();

        for _ in 0..iterations {
            let leaf = tree.select(self.config.exploration);
            let leaf = tree.expand(leaf, &mut self.rng);
            let result = rollout::simulate(&tree.get(leaf).state, root_player, &mut self.rng);
            tree.backpropagate(leaf, result, root_player);
        }

        trace!(
            iterations,
            nodes = tree.len(),
            root_visits = tree.get(tree.root()).visit_count,
            "mcts search complete"
        );
        tree
    }
}

impl Default for MctsEngine {
    fn default() -> Self {
        Self::new(MctsConfig::default())
    }
}

impl MovePolicy for MctsEngine {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        self.best_move(state)
    }

    fn name(&self) -> &str {
        "MCTS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    fn engine(seed: u64) -> MctsEngine {
        MctsEngine::new(MctsConfig::default()).with_seed(seed)
    }

    #[test]
    fn test_iteration_budget_schedule() {
        assert_eq!(iteration_budget(9, 2000), 500);
        assert_eq!(iteration_budget(8, 100), 100);
        assert_eq!(iteration_budget(7, 2000), 800);
        assert_eq!(iteration_budget(5, 2000), 800);
        assert_eq!(iteration_budget(4, 2000), 1500);
        assert_eq!(iteration_budget(1, 1000), 1000);
    }

    #[test]
    fn test_budget_one_returns_legal_move() {
        let boards = ["... / ... / ...", "X.. / .O. / ...", "XO. / .X. / O.."];
        for (seed, text) in boards.iter().enumerate() {
            let state = GameState::from_string(text, 3).unwrap();
            let mv = engine(seed as u64).search(&state, 1).unwrap();
            assert!(state.legal_moves().contains(&mv));
        }
    }

    #[test]
    fn test_budget_zero_falls_back_to_random_legal_move() {
        let state = GameState::standard();
        let mv = engine(4).search(&state, 0).unwrap();
        assert!(state.legal_moves().contains(&mv));
    }

    #[test]
    fn test_single_legal_move_skips_search() {
        let state = GameState::from_string("XOX / XOO / OX.", 3).unwrap();
        assert_eq!(engine(0).search(&state, 1000), Some(Move::new(2, 2)));
    }

    #[test]
    fn test_terminal_returns_none() {
        let state = GameState::from_string("XXX / OO. / ...", 3).unwrap();
        assert_eq!(engine(0).best_move(&state), None);
    }

    #[test]
    fn test_finds_immediate_win() {
        let state = GameState::from_string("XX. / OO. / ...", 3).unwrap();
        assert_eq!(state.to_move(), Player::X);
        assert_eq!(engine(7).best_move(&state), Some(Move::new(0, 2)));
    }

    #[test]
    fn test_blocks_immediate_loss() {
        let state = GameState::from_string("X.. / OO. / X..", 3).unwrap();
        assert_eq!(engine(8).best_move(&state), Some(Move::new(1, 2)));
    }

    #[test]
    fn test_root_visits_match_budget() {
        let state = GameState::standard();
        let tree = engine(1).build_tree(&state, 200);
        let root = tree.get(tree.root());
        assert_eq!(root.visit_count, 200);
        let child_visits: u32 = root.children.iter().map(|&id| tree.get(id).visit_count).sum();
        // The first iteration expands a child, so every visit passes through one.
        assert_eq!(child_visits, 200);
    }
}
