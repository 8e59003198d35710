//! Opponent kinds and the baseline policies behind them

use std::{fmt, str::FromStr};

use rand::{prelude::IndexedRandom, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    game::{GameState, Move},
    heuristic::HeuristicEngine,
    mcts::{MctsConfig, MctsEngine},
    minimax::MinimaxSearcher,
    ports::MovePolicy,
    utils::build_rng,
};

/// Iterations requested from the MCTS opponent before budget scaling.
pub const MCTS_OPPONENT_ITERATIONS: usize = 2000;

/// Who the learning agent plays against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentKind {
    Random,
    SmartRandom,
    Rules,
    Minimax,
    Mcts,
    /// The agent against a copy of its own table
    SelfPlay,
}

impl OpponentKind {
    pub const ALL: [OpponentKind; 6] = [
        OpponentKind::Random,
        OpponentKind::SmartRandom,
        OpponentKind::Rules,
        OpponentKind::Minimax,
        OpponentKind::Mcts,
        OpponentKind::SelfPlay,
    ];

    /// Opponents checked during verification (everything but self-play).
    pub const VERIFICATION: [OpponentKind; 5] = [
        OpponentKind::Random,
        OpponentKind::SmartRandom,
        OpponentKind::Rules,
        OpponentKind::Mcts,
        OpponentKind::Minimax,
    ];

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            OpponentKind::Random => "Random",
            OpponentKind::SmartRandom => "Smart Random",
            OpponentKind::Rules => "Rules",
            OpponentKind::Minimax => "Minimax",
            OpponentKind::Mcts => "MCTS",
            OpponentKind::SelfPlay => "Self-play",
        }
    }

    /// Get short label
    pub fn label(&self) -> &'static str {
        match self {
            OpponentKind::Random => "random",
            OpponentKind::SmartRandom => "smart_random",
            OpponentKind::Rules => "rules",
            OpponentKind::Minimax => "minimax",
            OpponentKind::Mcts => "mcts",
            OpponentKind::SelfPlay => "self",
        }
    }

    /// Build a fresh opponent. Self-play has no external policy and yields
    /// `None`.
    pub fn instantiate(self, seed: Option<u64>) -> Option<Opponent> {
        let opponent = match self {
            OpponentKind::Random => Opponent::Random(RandomPolicy::new(seed)),
            OpponentKind::SmartRandom => Opponent::SmartRandom(SmartRandomPolicy::new(seed)),
            OpponentKind::Rules => Opponent::Rules(HeuristicEngine::new()),
            OpponentKind::Minimax => {
                let searcher = MinimaxSearcher::new();
                Opponent::Minimax(match seed {
                    Some(seed) => searcher.with_seed(seed),
                    None => searcher,
                })
            }
            OpponentKind::Mcts => {
                let engine = MctsEngine::new(MctsConfig::with_iterations(MCTS_OPPONENT_ITERATIONS));
                Opponent::Mcts(match seed {
                    Some(seed) => engine.with_seed(seed),
                    None => engine,
                })
            }
            OpponentKind::SelfPlay => return None,
        };
        Some(opponent)
    }
}

impl fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OpponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentKind::Random),
            "smart_random" | "smart-random" => Ok(OpponentKind::SmartRandom),
            "rules" | "reguly" => Ok(OpponentKind::Rules),
            "minimax" => Ok(OpponentKind::Minimax),
            "mcts" => Ok(OpponentKind::Mcts),
            "self" | "self_play" | "self-play" => Ok(OpponentKind::SelfPlay),
            _ => Err(Error::UnknownOpponent {
                name: s.to_string(),
                expected: "random, smart_random, rules, minimax, mcts, self".to_string(),
            }),
        }
    }
}

/// A concrete opponent, one variant per non-self [`OpponentKind`].
#[derive(Debug, Clone)]
pub enum Opponent {
    Random(RandomPolicy),
    SmartRandom(SmartRandomPolicy),
    Rules(HeuristicEngine),
    Minimax(MinimaxSearcher),
    Mcts(MctsEngine),
}

impl MovePolicy for Opponent {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        match self {
            Opponent::Random(p) => p.select_move(state),
            Opponent::SmartRandom(p) => p.select_move(state),
            Opponent::Rules(p) => p.select_move(state),
            Opponent::Minimax(p) => p.select_move(state),
            Opponent::Mcts(p) => p.select_move(state),
        }
    }

    fn name(&self) -> &str {
        match self {
            Opponent::Random(p) => p.name(),
            Opponent::SmartRandom(p) => p.name(),
            Opponent::Rules(p) => p.name(),
            Opponent::Minimax(p) => p.name(),
            Opponent::Mcts(p) => p.name(),
        }
    }
}

/// Uniformly random legal moves
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: build_rng(seed),
        }
    }
}

impl MovePolicy for RandomPolicy {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        state.legal_moves().choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        "Random"
    }
}

/// Centre if free, else a random free corner, else any random move.
///
/// On boards other than 3×3 it plays uniformly at random.
#[derive(Debug, Clone)]
pub struct SmartRandomPolicy {
    rng: StdRng,
}

impl SmartRandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: build_rng(seed),
        }
    }
}

impl MovePolicy for SmartRandomPolicy {
    fn select_move(&mut self, state: &GameState) -> Option<Move> {
        let legal = state.legal_moves();
        if state.is_standard() {
            let center = state.center();
            if legal.contains(&center) {
                return Some(center);
            }
            let corners: Vec<Move> = state
                .corners()
                .into_iter()
                .filter(|c| legal.contains(c))
                .collect();
            if let Some(&corner) = corners.choose(&mut self.rng) {
                return Some(corner);
            }
        }
        legal.choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        "Smart Random"
    }
}
