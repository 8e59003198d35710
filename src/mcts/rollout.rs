//! Heuristic playout policy.

use rand::Rng;

use crate::{
    game::{GameOutcome, GameState, Move, Player},
    heuristic::{positional_weight, winning_move},
    utils::weighted_sample,
};

/// Pick a playout move: win if possible, else block, else sample with the
/// positional weights (centre 3, corners 2, rest 1).
pub fn rollout_move<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Option<Move> {
    let me = state.to_move();
    if let Some(mv) = winning_move(state, me).or_else(|| winning_move(state, me.opponent())) {
        return Some(mv);
    }

    let weighted: Vec<(Move, f64)> = state
        .legal_moves()
        .into_iter()
        .map(|mv| (mv, f64::from(positional_weight(state, mv))))
        .collect();
    weighted_sample(rng, &weighted)
}

/// Play `state` out to the end and score it for `root_player`:
/// 1.0 win, 0.0 loss, 0.5 draw.
pub fn simulate<R: Rng + ?Sized>(state: &GameState, root_player: Player, rng: &mut R) -> f64 {
    let mut playout = state.clone();
    while !playout.is_terminal() {
        let Some(mv) = rollout_move(&playout, rng) else {
            break;
        };
        playout.apply_move(mv.row, mv.col);
    }

    match playout.winner() {
        Some(GameOutcome::Win(winner)) if winner == root_player => 1.0,
        Some(GameOutcome::Win(_)) => 0.0,
        _ => 0.5,
    }
}
