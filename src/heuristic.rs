//! Rule-based move selection
//!
//! A strictly ordered cascade: each rule is consulted only when every rule
//! above it found nothing. On the standard 3×3 board the full cascade is
//! used:
//!
//! 1. win immediately
//! 2. block the opponent's immediate win
//! 3. create a fork (two winning replies at once)
//! 4. block the opponent's fork
//! 5. take the centre
//! 6. take the corner opposite an opponent corner
//! 7. take any corner
//! 8. take any edge
//!
//! Other board sizes use a reduced cascade: win, block, centre, first legal
//! move.

use crate::{
    game::{GameState, Move, Player},
    ports::MovePolicy,
};

const STANDARD_EDGES: [Move; 4] = [
    Move::new(0, 1),
    Move::new(1, 0),
    Move::new(1, 2),
    Move::new(2, 1),
];

/// First legal move (row-major) that wins on the spot for `player`,
/// regardless of whose turn it actually is.
pub fn winning_move(state: &GameState, player: Player) -> Option<Move> {
    let as_player = state.with_to_move(player);
    state.legal_moves().into_iter().find(|&mv| {
        as_player
            .after_move(mv)
            .is_some_and(|next| next.has_won(player))
    })
}

/// Number of distinct immediate winning moves `player` has in `state`.
fn threat_count(state: &GameState, player: Player) -> usize {
    let as_player = state.with_to_move(player);
    state
        .legal_moves()
        .into_iter()
        .filter(|&mv| {
            as_player
                .after_move(mv)
                .is_some_and(|next| next.has_won(player))
        })
        .take(2)
        .count()
}

/// First move that leaves `player` with at least two winning replies.
pub fn fork_move(state: &GameState, player: Player) -> Option<Move> {
    let as_player = state.with_to_move(player);
    state.legal_moves().into_iter().find(|&mv| {
        as_player
            .after_move(mv)
            .is_some_and(|next| threat_count(&next, player) >= 2)
    })
}

/// Answer an opponent fork: prefer a move that creates our own immediate
/// threat somewhere other than the fork square, else occupy the fork square.
fn fork_block(state: &GameState, me: Player, opponent: Player) -> Option<Move> {
    let fork_square = fork_move(state, opponent)?;
    let as_me = state.with_to_move(me);

    let forcing = state
        .legal_moves()
        .into_iter()
        .filter(|&mv| mv != fork_square)
        .find(|&mv| {
            as_me
                .after_move(mv)
                .and_then(|next| winning_move(&next, me))
                .is_some_and(|reply| reply != fork_square)
        });

    Some(forcing.unwrap_or(fork_square))
}

/// Static preference for a cell: centre 3, corners 2, everything else 1.
///
/// Used to bias rollouts and to break ties between equally scored moves.
pub fn positional_weight(state: &GameState, mv: Move) -> u8 {
    if mv == state.center() {
        3
    } else if state.is_corner(mv) {
        2
    } else {
        1
    }
}

fn opposite_corner(state: &GameState, opponent: Player) -> Option<Move> {
    let last = state.size() - 1;
    state
        .corners()
        .into_iter()
        .filter(|c| state.get(c.row, c.col) == opponent.to_cell())
        .map(|c| Move::new(last - c.row, last - c.col))
        .find(|opp| state.is_empty(opp.row, opp.col))
}

fn first_empty(state: &GameState, candidates: &[Move]) -> Option<Move> {
    candidates
        .iter()
        .copied()
        .find(|mv| state.is_empty(mv.row, mv.col))
}

/// Hand-coded rule cascade
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEngine;

impl HeuristicEngine {
    pub fn new() -> Self {
        HeuristicEngine
    }

    /// Pick a move for the player to move. `None` only when the board is full.
    pub fn best_move(&self, state: &GameState) -> Option<Move> {
        if state.legal_moves().is_empty() {
            return None;
        }
        if !state.is_standard() {
            return Self::reduced_cascade(state);
        }

        let me = state.to_move();
        let opponent = me.opponent();

        winning_move(state, me)
            .or_else(|| winning_move(state, opponent))
            .or_else(|| fork_move(state, me))
            .or_else(|| fork_block(state, me, opponent))
            .or_else(|| first_empty(state, &[state.center()]))
            .or_else(|| opposite_corner(state, opponent))
            .or_else(|| first_empty(state, &state.corners()))
            .or_else(|| first_empty(state, &STANDARD_EDGES))
    }

    fn reduced_cascade(state: &GameState) -> Option<Move> {
        let me = state.to_move();
        winning_move(state, me)
            .or_else(|| winning_move(state, me.opponent()))
            .or_else(|| first_empty(state, &[state.center()]))
            .or_else(|| state.legal_moves().first().copied())
    }
}

impl MovePolicy for HeuristicEngine {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        self.best_move(state)
    }

    fn name(&self) -> &str {
        "Rules"
    }
}
