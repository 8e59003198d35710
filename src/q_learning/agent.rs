//! Tabular Q-learning agent

use rand::{Rng, prelude::IndexedRandom, rngs::StdRng};

use super::q_table::{QTable, Transition};
use crate::{
    game::{GameState, Move, Player},
    heuristic::{HeuristicEngine, winning_move},
    ports::MovePolicy,
    utils::build_rng,
};

pub const DEFAULT_LEARNING_RATE: f64 = 0.3;
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.95;
pub const DEFAULT_EPSILON: f64 = 0.1;
/// Values this close to the maximum count as tied.
pub const TIE_TOLERANCE: f64 = 1e-4;

/// How a single decision is made from a value table.
///
/// Checked in order: rule cascade (`use_rules`), forced win/block
/// (`use_forced`), then ε-greedy over the canonical values with random
/// choice among near-ties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionSelector {
    pub epsilon: f64,
    pub use_forced: bool,
    pub use_rules: bool,
    pub tie_tolerance: f64,
}

impl ActionSelector {
    pub fn new(epsilon: f64, use_forced: bool, use_rules: bool) -> Self {
        Self {
            epsilon,
            use_forced,
            use_rules,
            tie_tolerance: TIE_TOLERANCE,
        }
    }

    /// Pure greedy play with the win/block override.
    pub fn greedy() -> Self {
        Self::new(0.0, true, false)
    }

    pub fn select<R: Rng + ?Sized>(&self, table: &QTable, state: &GameState, rng: &mut R) -> Option<Move> {
        if self.use_rules
            && let Some(mv) = HeuristicEngine::new().best_move(state)
        {
            return Some(mv);
        }
        if self.use_forced {
            let me = state.to_move();
            if let Some(mv) = winning_move(state, me).or_else(|| winning_move(state, me.opponent())) {
                return Some(mv);
            }
        }

        let legal = state.legal_moves();
        if legal.is_empty() {
            return None;
        }
        if rng.random::<f64>() < self.epsilon {
            return legal.choose(rng).copied();
        }

        let ctx = state.canonical_context();
        let canonical: Vec<Move> = legal.iter().map(|&mv| ctx.map_move_to_canonical(mv)).collect();
        let best = table.near_best_actions(&ctx.key, &canonical, self.tie_tolerance);
        best.choose(rng)
            .map(|&mv| ctx.map_canonical_to_original(mv))
    }
}

/// Turn one player's decisions in a finished game into TD transitions.
///
/// `decisions` are the `(position, move)` pairs where `player` moved, in
/// order. Each transition bootstraps from the position `player` faced at
/// its next turn; only the last one is terminal and carries the reward
/// (+1 win, -1 loss, 0 draw).
pub fn episode_transitions(
    decisions: &[(GameState, Move)],
    final_state: &GameState,
    player: Player,
) -> Vec<Transition> {
    let reward = final_state
        .winner()
        .map_or(0.0, |outcome| outcome.reward_for(player));

    decisions
        .iter()
        .enumerate()
        .map(|(i, (state, mv))| {
            let ctx = state.canonical_context();
            match decisions.get(i + 1) {
                Some((next, _)) => {
                    let next_ctx = next.canonical_context();
                    Transition {
                        state: ctx.key.clone(),
                        action: ctx.map_move_to_canonical(*mv),
                        reward: 0.0,
                        next_legal: next
                            .legal_moves()
                            .into_iter()
                            .map(|m| next_ctx.map_move_to_canonical(m))
                            .collect(),
                        next_state: next_ctx.key,
                        terminal: false,
                    }
                }
                None => Transition {
                    state: ctx.key.clone(),
                    action: ctx.map_move_to_canonical(*mv),
                    reward,
                    next_state: final_state.canonical_key(),
                    next_legal: Vec::new(),
                    terminal: true,
                },
            }
        })
        .collect()
}

/// Q-learning agent over canonical board keys.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    pub(super) table: QTable,
    epsilon: f64,
    board_size: usize,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(learning_rate: f64, discount_factor: f64, epsilon: f64) -> Self {
        Self {
            table: QTable::new(learning_rate, discount_factor),
            epsilon,
            board_size: 3,
            rng: build_rng(None),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = build_rng(Some(seed));
        self
    }

    /// Board size this agent plays and accepts snapshots for.
    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = size;
        self
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut QTable {
        &mut self.table
    }

    pub fn select_action(
        &mut self,
        state: &GameState,
        epsilon: f64,
        use_forced: bool,
        use_rules: bool,
    ) -> Option<Move> {
        ActionSelector::new(epsilon, use_forced, use_rules).select(&self.table, state, &mut self.rng)
    }

    /// Greedy move with the win/block override.
    pub fn best_move(&mut self, state: &GameState) -> Option<Move> {
        ActionSelector::greedy().select(&self.table, state, &mut self.rng)
    }

    /// Learned values of each legal move, in the caller's frame.
    pub fn move_values(&self, state: &GameState) -> Vec<(Move, f64)> {
        let ctx = state.canonical_context();
        state
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, self.table.get(&ctx.key, ctx.map_move_to_canonical(mv))))
            .collect()
    }

    pub fn update(&mut self, transition: &Transition) -> f64 {
        self.table.apply(transition)
    }

    /// Learn from one finished game immediately. Returns the number of
    /// transitions applied.
    pub fn learn_episode(&mut self, decisions: &[(GameState, Move)], final_state: &GameState, player: Player) -> usize {
        let transitions = episode_transitions(decisions, final_state, player);
        for transition in &transitions {
            self.table.apply(transition);
        }
        transitions.len()
    }
}

impl Default for QLearningAgent {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, DEFAULT_DISCOUNT_FACTOR, DEFAULT_EPSILON)
    }
}

impl MovePolicy for QLearningAgent {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        self.best_move(state)
    }

    fn name(&self) -> &str {
        "Q-learning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::D4Transform;

    fn board(text: &str) -> GameState {
        GameState::from_string(text, 3).unwrap()
    }

    #[test]
    fn test_forced_win_and_block() {
        let mut agent = QLearningAgent::default().with_seed(1);
        let win = board("XX. / OO. / ...");
        assert_eq!(agent.select_action(&win, 1.0, true, false), Some(Move::new(0, 2)));

        let block = board("X.. / OO. / X..");
        assert_eq!(agent.select_action(&block, 0.0, true, false), Some(Move::new(1, 2)));
    }

    #[test]
    fn test_rules_override_takes_precedence() {
        let mut agent = QLearningAgent::default().with_seed(2);
        let state = GameState::standard();
        for _ in 0..10 {
            assert_eq!(agent.select_action(&state, 1.0, false, true), Some(Move::new(1, 1)));
        }
    }

    #[test]
    fn test_greedy_follows_learned_value_through_symmetry() {
        let mut agent = QLearningAgent::default().with_seed(3);
        let state = board("X.. / .O. / ...");
        let target = Move::new(2, 2);
        let ctx = state.canonical_context();
        agent
            .table_mut()
            .set(ctx.key.clone(), ctx.map_move_to_canonical(target), 0.9);

        assert_eq!(agent.select_action(&state, 0.0, false, false), Some(target));

        // A rotated copy of the position picks the rotated move.
        let rotate = D4Transform {
            rotation: 90,
            reflection: false,
        };
        let rotated = state.transform(&rotate);
        let expected = rotate.transform_move(target, 3);
        assert_eq!(agent.select_action(&rotated, 0.0, false, false), Some(expected));
    }

    #[test]
    fn test_near_ties_are_randomized() {
        let mut agent = QLearningAgent::default().with_seed(4);
        let state = GameState::standard();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(agent.select_action(&state, 0.0, false, false).unwrap());
        }
        // Every move ties on an empty table.
        assert!(seen.len() > 3);
    }

    #[test]
    fn test_full_board_has_no_action() {
        let mut agent = QLearningAgent::default();
        assert_eq!(agent.best_move(&board("XOX / XOO / OXX")), None);
    }

    #[test]
    fn test_episode_transitions_shape() {
        // X: (0,0), (0,1), (0,2) wins; O: (1,0), (1,1)
        let mut state = GameState::standard();
        let mut x_decisions = Vec::new();
        for (r, c) in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
            if state.to_move() == Player::X {
                x_decisions.push((state.clone(), Move::new(r, c)));
            }
            assert!(state.apply_move(r, c));
        }

        let transitions = episode_transitions(&x_decisions, &state, Player::X);
        assert_eq!(transitions.len(), 3);
        assert!(transitions[..2].iter().all(|t| !t.terminal && t.reward == 0.0));
        assert_eq!(transitions[0].next_state, x_decisions[1].0.canonical_key());
        assert_eq!(transitions[0].next_legal.len(), 7);

        let last = &transitions[2];
        assert!(last.terminal);
        assert_eq!(last.reward, 1.0);

        let o_decisions: Vec<_> = Vec::new();
        assert!(episode_transitions(&o_decisions, &state, Player::O).is_empty());
    }

    #[test]
    fn test_learn_episode_rewards_winning_line() {
        let mut agent = QLearningAgent::default();
        let before = board("XX. / OO. / ...");
        let mv = Move::new(0, 2);
        let after = before.after_move(mv).unwrap();

        assert_eq!(agent.learn_episode(&[(before.clone(), mv)], &after, Player::X), 1);
        let values = agent.move_values(&before);
        let (_, winning) = values.iter().find(|(m, _)| *m == mv).unwrap();
        assert!((winning - DEFAULT_LEARNING_RATE).abs() < 1e-12);
    }
}
