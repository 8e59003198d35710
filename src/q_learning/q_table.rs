//! Value table for temporal difference learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::{Move, StateKey};

/// One step of experience, already in the canonical frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: StateKey,
    /// Action in the canonical frame of `state`
    pub action: Move,
    pub reward: f64,
    pub next_state: StateKey,
    /// Legal actions in the canonical frame of `next_state`
    pub next_legal: Vec<Move>,
    pub terminal: bool,
}

/// Smallest step an update takes, however often a pair has been visited.
pub const MIN_STEP_SIZE: f64 = 0.02;

/// Stored value of one state-action pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Slot {
    value: f64,
    /// TD updates applied so far
    visits: u32,
}

/// Q-values keyed by canonical state and canonical move.
///
/// Unseen pairs read as 0.0. Entries are only ever added or overwritten;
/// [`QTable::reset`] exists for discarding a failed load.
///
/// The n-th update of a pair steps by `max(α/√n, min(MIN_STEP_SIZE, α))`.
/// Targets against a stochastic opponent are noisy, and a constant step
/// keeps that noise in the values; the max over noisy successors then
/// inflates them.
#[derive(Debug, Clone)]
pub struct QTable {
    values: HashMap<(StateKey, Move), Slot>,
    /// Learning rate α: the step of a pair's first update
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
}

impl QTable {
    pub fn new(learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            values: HashMap::new(),
            learning_rate,
            discount_factor,
        }
    }

    pub fn get(&self, state: &StateKey, action: Move) -> f64 {
        self.values
            .get(&(state.clone(), action))
            .map_or(0.0, |slot| slot.value)
    }

    /// Updates applied to a pair so far.
    pub fn visits(&self, state: &StateKey, action: Move) -> u32 {
        self.values
            .get(&(state.clone(), action))
            .map_or(0, |slot| slot.visits)
    }

    /// Overwrite a value, keeping the pair's visit count.
    pub fn set(&mut self, state: StateKey, action: Move, value: f64) {
        self.values.entry((state, action)).or_default().value = value;
    }

    /// Restore a stored pair with its visit count.
    pub fn restore(&mut self, state: StateKey, action: Move, value: f64, visits: u32) {
        self.values.insert((state, action), Slot { value, visits });
    }

    /// Step size for the `visits`-th update of a pair (1-based).
    pub fn step_size(&self, visits: u32) -> f64 {
        let floor = MIN_STEP_SIZE.min(self.learning_rate);
        (self.learning_rate / f64::from(visits.max(1)).sqrt()).max(floor)
    }

    /// Highest value over `legal_actions`; 0.0 when there are none.
    pub fn max_q(&self, state: &StateKey, legal_actions: &[Move]) -> f64 {
        legal_actions
            .iter()
            .map(|&action| self.get(state, action))
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// All actions whose value lies within `tolerance` of the best one.
    pub fn near_best_actions(&self, state: &StateKey, legal_actions: &[Move], tolerance: f64) -> Vec<Move> {
        let best = self.max_q(state, legal_actions);
        legal_actions
            .iter()
            .copied()
            .filter(|&action| (self.get(state, action) - best).abs() <= tolerance)
            .collect()
    }

    /// TD(0) update, returning the new value.
    ///
    /// target = r when terminal, else r + γ·max Q(s′,·)
    /// Q(s,a) ← Q(s,a) + αₙ·(target − Q(s,a)), αₙ from [`QTable::step_size`]
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Move,
        reward: f64,
        next_state: &StateKey,
        next_legal: &[Move],
        terminal: bool,
    ) -> f64 {
        let target = if terminal {
            reward
        } else {
            reward + self.discount_factor * self.max_q(next_state, next_legal)
        };
        let slot = self.values.get(&(state.clone(), action)).copied().unwrap_or_default();
        let visits = slot.visits.saturating_add(1);
        let value = slot.value + self.step_size(visits) * (target - slot.value);
        self.restore(state.clone(), action, value, visits);
        value
    }

    pub fn apply(&mut self, transition: &Transition) -> f64 {
        self.update(
            &transition.state,
            transition.action,
            transition.reward,
            &transition.next_state,
            &transition.next_legal,
            transition.terminal,
        )
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn entries(&self) -> impl Iterator<Item = (&StateKey, Move, f64)> + '_ {
        self.values
            .iter()
            .map(|((state, action), slot)| (state, *action, slot.value))
    }

    /// Like [`QTable::entries`], with each pair's visit count.
    pub fn entries_with_visits(&self) -> impl Iterator<Item = (&StateKey, Move, f64, u32)> + '_ {
        self.values
            .iter()
            .map(|((state, action), slot)| (state, *action, slot.value, slot.visits))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every stored value.
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

impl Extend<(StateKey, Move, f64, u32)> for QTable {
    fn extend<I: IntoIterator<Item = (StateKey, Move, f64, u32)>>(&mut self, iter: I) {
        for (state, action, value, visits) in iter {
            self.restore(state, action, value, visits);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;

    fn keys() -> (StateKey, StateKey) {
        let empty = GameState::standard();
        let after = empty.after_move(Move::new(1, 1)).unwrap();
        (empty.canonical_key(), after.canonical_key())
    }

    #[test]
    fn test_unseen_pairs_read_zero() {
        let table = QTable::new(0.3, 0.95);
        let (s, _) = keys();
        assert_eq!(table.get(&s, Move::new(0, 0)), 0.0);
        assert_eq!(table.max_q(&s, &[]), 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_max_q_and_near_ties() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, _) = keys();
        table.set(s.clone(), Move::new(0, 0), 0.5);
        table.set(s.clone(), Move::new(0, 1), 0.80005);
        table.set(s.clone(), Move::new(1, 1), 0.8);
        let legal = [Move::new(0, 0), Move::new(0, 1), Move::new(1, 1)];

        assert_eq!(table.max_q(&s, &legal), 0.80005);
        assert_eq!(
            table.near_best_actions(&s, &legal, 1e-4),
            vec![Move::new(0, 1), Move::new(1, 1)]
        );
    }

    #[test]
    fn test_terminal_update_is_exact() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, s2) = keys();
        let a = Move::new(1, 1);
        table.set(s.clone(), a, 0.2);

        let updated = table.update(&s, a, 1.0, &s2, &[Move::new(0, 0)], true);
        // 0.2 + 0.3 * (1.0 - 0.2)
        assert!((updated - 0.44).abs() < 1e-12);
        assert_eq!(table.get(&s, a), updated);
    }

    #[test]
    fn test_bootstrapped_update_is_exact() {
        let mut table = QTable::new(0.5, 0.9);
        let (s, s2) = keys();
        table.set(s2.clone(), Move::new(0, 0), 0.4);
        table.set(s2.clone(), Move::new(0, 1), -0.2);

        let next_legal = [Move::new(0, 0), Move::new(0, 1)];
        let updated = table.update(&s, Move::new(1, 1), 0.0, &s2, &next_legal, false);
        // 0 + 0.5 * (0 + 0.9 * 0.4 - 0)
        assert!((updated - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_non_terminal_without_moves_bootstraps_zero() {
        let mut table = QTable::new(0.5, 0.9);
        let (s, s2) = keys();
        let updated = table.update(&s, Move::new(0, 0), -1.0, &s2, &[], false);
        assert!((updated + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_step_size_decays_with_visits() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, s2) = keys();
        let a = Move::new(0, 0);

        let first = table.update(&s, a, 1.0, &s2, &[], true);
        assert!((first - 0.3).abs() < 1e-12);
        let second = table.update(&s, a, 1.0, &s2, &[], true);
        // 0.3 + 0.3/√2 · 0.7
        assert!((second - (0.3 + 0.3 / 2f64.sqrt() * 0.7)).abs() < 1e-12);
        assert_eq!(table.visits(&s, a), 2);

        assert!((table.step_size(1) - 0.3).abs() < 1e-12);
        assert_eq!(table.step_size(10_000), MIN_STEP_SIZE);
        table.set_learning_rate(0.01);
        assert_eq!(table.step_size(10_000), 0.01);
    }

    #[test]
    fn test_noisy_targets_settle_near_their_mean() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, s2) = keys();
        let a = Move::new(0, 0);
        // Alternating +1/-1 targets average to zero.
        for i in 0..2_000 {
            let reward = if i % 2 == 0 { 1.0 } else { -1.0 };
            table.update(&s, a, reward, &s2, &[], true);
        }
        assert!(table.get(&s, a).abs() < 0.05, "value {}", table.get(&s, a));
    }

    #[test]
    fn test_set_keeps_visits() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, s2) = keys();
        let a = Move::new(0, 0);
        table.update(&s, a, 1.0, &s2, &[], true);
        table.set(s.clone(), a, 0.5);
        assert_eq!(table.visits(&s, a), 1);
        assert_eq!(table.get(&s, a), 0.5);
    }

    #[test]
    fn test_apply_transition_and_learning_rate_change() {
        let mut table = QTable::new(0.3, 0.95);
        let (s, s2) = keys();
        table.set_learning_rate(0.1);
        let transition = Transition {
            state: s.clone(),
            action: Move::new(0, 0),
            reward: 1.0,
            next_state: s2,
            next_legal: Vec::new(),
            terminal: true,
        };
        assert!((table.apply(&transition) - 0.1).abs() < 1e-12);
        assert_eq!(table.len(), 1);
        assert_eq!(table.learning_rate(), 0.1);
    }
}
