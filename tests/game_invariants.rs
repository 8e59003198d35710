//! Board invariants checked over random games on several board sizes

mod common;

use kinarow::game::{D4Transform, GameState, Player};
use rand::{SeedableRng, rngs::StdRng};

fn boards() -> Vec<GameState> {
    vec![
        GameState::standard(),
        GameState::new(4, 3).unwrap(),
        GameState::new(4, 4).unwrap(),
        GameState::new(5, 4).unwrap(),
    ]
}

#[test]
fn occupied_plus_legal_covers_the_board() {
    let mut rng = StdRng::seed_from_u64(7);
    for start in boards() {
        for _ in 0..50 {
            for (state, _) in common::random_trajectory(start.clone(), &mut rng) {
                let cells = state.size() * state.size();
                assert_eq!(state.occupied_count() + state.legal_moves().len(), cells);
                assert_eq!(state.empty_count(), state.legal_moves().len());
            }
        }
    }
}

#[test]
fn turns_alternate_on_accepted_moves() {
    let mut rng = StdRng::seed_from_u64(8);
    for start in boards() {
        let trajectory = common::random_trajectory(start, &mut rng);
        for window in trajectory.windows(2) {
            let (before, mv) = &window[0];
            let (after, _) = &window[1];
            assert!(mv.is_some());
            assert_eq!(after.to_move(), before.to_move().opponent());
            assert_eq!(after.occupied_count(), before.occupied_count() + 1);
        }
    }
}

#[test]
fn rejected_moves_leave_the_board_unchanged() {
    let mut state = GameState::standard();
    assert!(state.apply_move(1, 1));
    let snapshot = state.clone();
    assert!(!state.apply_move(1, 1));
    assert!(!state.apply_move(3, 0));
    assert_eq!(state, snapshot);
    assert_eq!(state.to_move(), Player::O);
}

#[test]
fn winner_is_invariant_under_symmetry() {
    let mut rng = StdRng::seed_from_u64(9);
    for start in boards() {
        for _ in 0..30 {
            for (state, _) in common::random_trajectory(start.clone(), &mut rng) {
                for t in D4Transform::all() {
                    assert_eq!(state.transform(&t).winner(), state.winner(), "{t:?} on\n{state}");
                }
            }
        }
    }
}

#[test]
fn canonical_key_is_invariant_under_symmetry() {
    let mut rng = StdRng::seed_from_u64(10);
    for start in boards() {
        for _ in 0..20 {
            for (state, mv) in common::random_trajectory(start.clone(), &mut rng) {
                let key = state.canonical_key();
                let ctx = state.canonical_context();
                for t in D4Transform::all() {
                    let image = state.transform(&t);
                    assert_eq!(image.canonical_key(), key);

                    // Symmetric moves lead to symmetric positions.
                    if let Some(mv) = mv {
                        let moved = image.after_move(t.transform_move(mv, state.size())).unwrap();
                        assert_eq!(moved.canonical_key(), state.after_move(mv).unwrap().canonical_key());
                        assert_eq!(ctx.map_canonical_to_original(ctx.map_move_to_canonical(mv)), mv);
                    }
                }
            }
        }
    }
}

#[test]
fn finished_games_have_a_result_or_full_board() {
    let mut rng = StdRng::seed_from_u64(11);
    for start in boards() {
        for _ in 0..50 {
            let trajectory = common::random_trajectory(start.clone(), &mut rng);
            let (last, _) = trajectory.last().unwrap();
            assert!(last.is_terminal());
            assert!(last.winner().is_some());
        }
    }
}
