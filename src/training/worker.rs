//! Batch worker: plays games against one opponent from a frozen table

use std::ops::AddAssign;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::opponent::{Opponent, OpponentKind};
use crate::{
    game::{GameOutcome, GameState, Move, Player},
    ports::MovePolicy,
    q_learning::{ActionSelector, QTable, Transition, episode_transitions},
    utils::build_rng,
};

/// Win/draw/loss counts from the learning agent's point of view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

impl GameStats {
    pub fn games(&self) -> usize {
        self.wins + self.draws + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        rate(self.wins, self.games())
    }

    pub fn draw_rate(&self) -> f64 {
        rate(self.draws, self.games())
    }

    pub fn loss_rate(&self) -> f64 {
        rate(self.losses, self.games())
    }

    /// Count one finished game for `player`.
    pub fn record(&mut self, outcome: Option<GameOutcome>, player: Player) {
        match outcome {
            Some(GameOutcome::Win(winner)) if winner == player => self.wins += 1,
            Some(GameOutcome::Win(_)) => self.losses += 1,
            Some(GameOutcome::Draw) | None => self.draws += 1,
        }
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total > 0 {
        count as f64 / total as f64
    } else {
        0.0
    }
}

impl AddAssign for GameStats {
    fn add_assign(&mut self, other: Self) {
        self.wins += other.wins;
        self.draws += other.draws;
        self.losses += other.losses;
    }
}

/// One worker's share of an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub opponent: OpponentKind,
    pub epsilon: f64,
    pub games: usize,
    /// Seed for this worker's generator and its opponent
    pub seed: Option<u64>,
    pub use_rules: bool,
    /// Record transitions; verification batches skip this
    pub record: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub stats: GameStats,
    /// Transitions in game order, ready for sequential application
    pub transitions: Vec<Transition>,
}

/// Play `job.games` games from the empty 3×3 board.
///
/// The agent reads `snapshot` only. Against external opponents it plays X.
/// In self-play both sides use the snapshot, the counted side alternates
/// between X and O by game index, and both sides' transitions are kept.
/// Forced win/block is always on.
pub fn play_batch(snapshot: &QTable, job: &BatchJob) -> BatchResult {
    let mut rng = build_rng(job.seed);
    let selector = ActionSelector::new(job.epsilon, true, job.use_rules);
    let mut opponent = job.opponent.instantiate(job.seed.map(|s| s ^ 0x5EED));
    let mut result = BatchResult::default();

    for game in 0..job.games {
        let agent_player = match opponent {
            None if game % 2 == 1 => Player::O,
            _ => Player::X,
        };

        let (final_state, x_moves, o_moves) =
            play_game(snapshot, &selector, opponent.as_mut(), agent_player, &mut rng);
        result.stats.record(final_state.winner(), agent_player);

        if !job.record {
            continue;
        }
        match opponent {
            Some(_) => {
                let decisions = if agent_player == Player::X { &x_moves } else { &o_moves };
                result
                    .transitions
                    .extend(episode_transitions(decisions, &final_state, agent_player));
            }
            None => {
                result
                    .transitions
                    .extend(episode_transitions(&x_moves, &final_state, Player::X));
                result
                    .transitions
                    .extend(episode_transitions(&o_moves, &final_state, Player::O));
            }
        }
    }
    result
}

type Decisions = Vec<(GameState, Move)>;

/// Play one game. `opponent == None` means the snapshot plays both sides.
fn play_game(
    snapshot: &QTable,
    selector: &ActionSelector,
    mut opponent: Option<&mut Opponent>,
    agent_player: Player,
    rng: &mut StdRng,
) -> (GameState, Decisions, Decisions) {
    let mut state = GameState::standard();
    let mut x_moves = Vec::new();
    let mut o_moves = Vec::new();

    while !state.is_terminal() {
        let mover = state.to_move();
        let choice = match opponent.as_deref_mut() {
            Some(policy) if mover != agent_player => policy.select_move(&state),
            _ => selector.select(snapshot, &state, rng),
        };
        let Some(mv) = choice else {
            break;
        };

        let before = state.clone();
        if !state.apply_move(mv.row, mv.col) {
            break;
        }
        match mover {
            Player::X => x_moves.push((before, mv)),
            Player::O => o_moves.push((before, mv)),
        }
    }
    (state, x_moves, o_moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(opponent: OpponentKind, games: usize) -> BatchJob {
        BatchJob {
            opponent,
            epsilon: 0.5,
            games,
            seed: Some(11),
            use_rules: false,
            record: true,
        }
    }

    #[test]
    fn test_stats_rates_and_merge() {
        let mut stats = GameStats {
            wins: 3,
            draws: 1,
            losses: 0,
        };
        stats += GameStats {
            wins: 1,
            draws: 2,
            losses: 1,
        };
        assert_eq!(stats.games(), 8);
        assert_eq!(stats.win_rate(), 0.5);
        assert_eq!(stats.loss_rate(), 0.125);
        assert_eq!(GameStats::default().win_rate(), 0.0);
    }

    #[test]
    fn test_record_counts_from_agent_view() {
        let mut stats = GameStats::default();
        stats.record(Some(GameOutcome::Win(Player::O)), Player::O);
        stats.record(Some(GameOutcome::Win(Player::X)), Player::O);
        stats.record(Some(GameOutcome::Draw), Player::O);
        assert_eq!(
            stats,
            GameStats {
                wins: 1,
                draws: 1,
                losses: 1
            }
        );
    }

    #[test]
    fn test_batch_plays_every_game() {
        let table = QTable::new(0.3, 0.95);
        let result = play_batch(&table, &job(OpponentKind::Random, 20));
        assert_eq!(result.stats.games(), 20);
        // One terminal transition per game for the agent.
        assert_eq!(result.transitions.iter().filter(|t| t.terminal).count(), 20);
    }

    #[test]
    fn test_self_play_records_both_sides() {
        let table = QTable::new(0.3, 0.95);
        let result = play_batch(&table, &job(OpponentKind::SelfPlay, 10));
        assert_eq!(result.stats.games(), 10);
        assert_eq!(result.transitions.iter().filter(|t| t.terminal).count(), 20);
    }

    #[test]
    fn test_verification_batch_records_nothing() {
        let table = QTable::new(0.3, 0.95);
        let batch = BatchJob {
            epsilon: 0.0,
            record: false,
            ..job(OpponentKind::Rules, 5)
        };
        let result = play_batch(&table, &batch);
        assert_eq!(result.stats.games(), 5);
        assert!(result.transitions.is_empty());
    }

    #[test]
    fn test_same_seed_same_batch() {
        let table = QTable::new(0.3, 0.95);
        let a = play_batch(&table, &job(OpponentKind::SmartRandom, 30));
        let b = play_batch(&table, &job(OpponentKind::SmartRandom, 30));
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.transitions, b.transitions);
    }

    #[test]
    fn test_minimax_never_loses_to_empty_table() {
        let table = QTable::new(0.3, 0.95);
        let result = play_batch(&table, &job(OpponentKind::Minimax, 10));
        assert_eq!(result.stats.wins, 0);
    }
}
