//! Common test utilities for the kinarow test suite.

#![allow(dead_code)]

use kinarow::{
    game::{GameState, Move},
    ports::MovePolicy,
};
use rand::{prelude::IndexedRandom, rngs::StdRng};

/// Play `state` to the end with `x` and `o` choosing moves.
pub fn play_out(mut state: GameState, x: &mut dyn MovePolicy, o: &mut dyn MovePolicy) -> GameState {
    while !state.is_terminal() {
        let policy: &mut dyn MovePolicy = match state.to_move() {
            kinarow::Player::X => &mut *x,
            kinarow::Player::O => &mut *o,
        };
        let Some(mv) = policy.select_move(&state) else {
            break;
        };
        assert!(
            state.apply_move(mv.row, mv.col),
            "{} returned illegal move {mv} on\n{state}",
            policy.name()
        );
    }
    state
}

/// Every position of one uniformly random game, starting with `start`.
pub fn random_trajectory(start: GameState, rng: &mut StdRng) -> Vec<(GameState, Option<Move>)> {
    let mut states = Vec::new();
    let mut state = start;
    loop {
        let mv = if state.is_terminal() {
            None
        } else {
            state.legal_moves().choose(rng).copied()
        };
        states.push((state.clone(), mv));
        match mv {
            Some(mv) => {
                state.apply_move(mv.row, mv.col);
            }
            None => return states,
        }
    }
}
