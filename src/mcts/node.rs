//! Search tree node.

use crate::game::{GameState, Move, Player};

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct MctsNode {
    pub state: GameState,
    /// `None` for the root
    pub parent: Option<NodeId>,
    /// Move that led here from the parent
    pub incoming_move: Option<Move>,
    pub children: Vec<NodeId>,
    pub visit_count: u32,
    /// Sum of backed-up results, each in [0, 1]
    pub total_score: f64,
    /// Legal moves not yet expanded into children
    pub untried_moves: Vec<Move>,
    /// Player who made the move into this node (`None` for the root)
    pub perspective: Option<Player>,
}

impl MctsNode {
    pub fn new_root(state: GameState) -> Self {
        let untried_moves = state.legal_moves();
        Self {
            state,
            parent: None,
            incoming_move: None,
            children: Vec::new(),
            visit_count: 0,
            total_score: 0.0,
            untried_moves,
            perspective: None,
        }
    }

    pub fn new_child(parent: NodeId, parent_state: &GameState, mv: Move, state: GameState) -> Self {
        let untried_moves = state.legal_moves();
        Self {
            state,
            parent: Some(parent),
            incoming_move: Some(mv),
            children: Vec::new(),
            visit_count: 0,
            total_score: 0.0,
            untried_moves,
            perspective: Some(parent_state.to_move()),
        }
    }

    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried_moves.is_empty()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Average backed-up result; 0 before the first visit.
    #[inline]
    pub fn mean_score(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_score / self.visit_count as f64
        }
    }

    /// UCB1 = mean + c * sqrt(ln(N_parent) / N).
    ///
    /// Unvisited nodes score +inf so each child is tried once before any is
    /// revisited.
    #[inline]
    pub fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visit_count == 0 {
            return f64::INFINITY;
        }
        let visits = self.visit_count as f64;
        self.mean_score() + exploration * ((parent_visits as f64).ln() / visits).sqrt()
    }

    pub(crate) fn record(&mut self, result: f64) {
        self.visit_count += 1;
        self.total_score += result;
    }
}
