//! Search-tree capture for inspection and visualization

use serde::{Deserialize, Serialize};

use super::search::{MinimaxSearcher, evaluate};
use crate::game::{GameState, Move, Player};

/// One explored position.
///
/// Children appear in the order they were searched; pruned siblings are
/// simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchNode {
    pub state: GameState,
    /// Move that led here (`None` at the root)
    pub mv: Option<Move>,
    pub score: i32,
    /// Ply from the root
    pub depth: usize,
    pub is_maximizing: bool,
    pub alpha_at_entry: i32,
    pub beta_at_entry: i32,
    pub children: Vec<SearchNode>,
}

impl SearchNode {
    fn new(state: GameState, depth: usize, is_maximizing: bool, alpha: i32, beta: i32) -> Self {
        Self {
            state,
            mv: None,
            score: 0,
            depth,
            is_maximizing,
            alpha_at_entry: alpha,
            beta_at_entry: beta,
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SearchNode::node_count).sum::<usize>()
    }

    /// Deepest ply reached below this node.
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(SearchNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child reached by `mv`.
    pub fn child(&self, mv: Move) -> Option<&SearchNode> {
        self.children.iter().find(|c| c.mv == Some(mv))
    }
}

impl MinimaxSearcher {
    /// Same search as [`MinimaxSearcher::best_move`], but scored for
    /// `maximizing_player` and returning the explored tree alongside the move.
    ///
    /// With the same seed and `maximizing_player == state.to_move()`, the
    /// chosen move matches `best_move`.
    pub fn best_move_with_tree(
        &mut self,
        state: &GameState,
        maximizing_player: Player,
    ) -> (Option<Move>, Option<SearchNode>) {
        if state.is_terminal() || state.legal_moves().is_empty() {
            return (None, None);
        }

        let depth = self.search_depth(state);
        let root_maximizing = state.to_move() == maximizing_player;
        let mut root = SearchNode::new(state.clone(), 0, root_maximizing, i32::MIN, i32::MAX);

        let mut scored = Vec::new();
        for mv in state.legal_moves() {
            let Some(next) = state.after_move(mv) else {
                continue;
            };
            let mut child = build_subtree(
                next,
                depth.saturating_sub(1),
                depth,
                i32::MIN,
                i32::MAX,
                !root_maximizing,
                maximizing_player,
            );
            child.mv = Some(mv);
            scored.push((mv, child.score));
            root.children.push(child);
        }

        // The picker always maximizes; flip scores for a minimizing root.
        let oriented: Vec<(Move, i32)> = if root_maximizing {
            scored
        } else {
            scored.into_iter().map(|(mv, s)| (mv, -s)).collect()
        };
        let best = self.pick_best(&oriented);

        root.score = root
            .children
            .iter()
            .map(|c| c.score)
            .reduce(|a, b| if root_maximizing { a.max(b) } else { a.min(b) })
            .unwrap_or(0);

        (best, Some(root))
    }
}

fn build_subtree(
    state: GameState,
    remaining: usize,
    full_depth: usize,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    player: Player,
) -> SearchNode {
    let mut node = SearchNode::new(state, full_depth - remaining, maximizing, alpha, beta);

    if remaining == 0 || node.state.is_terminal() {
        node.score = evaluate(&node.state, player, remaining);
        return node;
    }

    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for mv in node.state.legal_moves() {
        let Some(next) = node.state.after_move(mv) else {
            continue;
        };
        let mut child = build_subtree(next, remaining - 1, full_depth, alpha, beta, !maximizing, player);
        child.mv = Some(mv);
        let score = child.score;
        node.children.push(child);

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

    node.score = best;
    node
}
