//! Curriculum phases, the phase-two opponent schedule and run reports

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use super::{opponent::OpponentKind, worker::GameStats};

/// Stage of the curriculum an iteration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurriculumPhase {
    /// Sequential games against minimax, learning after each game
    WarmUp,
    /// Broad exploration against the random opponent
    Exploration,
    /// Mixed opponents on the fixed schedule
    Strategy,
    /// Low learning rate play against minimax
    Correction,
}

impl CurriculumPhase {
    pub fn label(&self) -> &'static str {
        match self {
            CurriculumPhase::WarmUp => "warm-up",
            CurriculumPhase::Exploration => "phase 1",
            CurriculumPhase::Strategy => "phase 2",
            CurriculumPhase::Correction => "phase 3",
        }
    }
}

impl fmt::Display for CurriculumPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase-two opponent schedule.
///
/// Iterations up to `opening_until` use `opening`, those up to
/// `middle_until` use `middle`, later ones cycle through `rotation` by
/// iteration number.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase2Schedule {
    pub opening_until: usize,
    pub opening: (OpponentKind, f64),
    pub middle_until: usize,
    pub middle: (OpponentKind, f64),
    /// Never empty
    pub rotation: Vec<(OpponentKind, f64)>,
}

impl Phase2Schedule {
    /// Opponent and exploration rate for a phase-two iteration (1-based).
    pub fn entry(&self, iteration: usize) -> (OpponentKind, f64) {
        if iteration <= self.opening_until {
            self.opening
        } else if iteration <= self.middle_until || self.rotation.is_empty() {
            self.middle
        } else {
            self.rotation[iteration % self.rotation.len()]
        }
    }
}

impl Default for Phase2Schedule {
    fn default() -> Self {
        Self {
            opening_until: 10,
            opening: (OpponentKind::SmartRandom, 0.3),
            middle_until: 25,
            middle: (OpponentKind::SelfPlay, 0.25),
            rotation: vec![
                (OpponentKind::Rules, 0.15),
                (OpponentKind::Minimax, 0.1),
                (OpponentKind::SelfPlay, 0.2),
            ],
        }
    }
}

/// Entry of the default phase-two schedule.
///
/// ```
/// use kinarow::training::{OpponentKind, phase2_schedule};
///
/// assert_eq!(phase2_schedule(1), (OpponentKind::SmartRandom, 0.3));
/// assert_eq!(phase2_schedule(26), (OpponentKind::SelfPlay, 0.2));
/// assert_eq!(phase2_schedule(27), (OpponentKind::Rules, 0.15));
/// ```
pub fn phase2_schedule(iteration: usize) -> (OpponentKind, f64) {
    Phase2Schedule::default().entry(iteration)
}

/// Opponents for every phase, resolved from a trainer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CurriculumPlan {
    pub phase1_opponent: OpponentKind,
    pub phase2: Phase2Schedule,
    pub phase3_opponent: OpponentKind,
}

impl Default for CurriculumPlan {
    fn default() -> Self {
        Self {
            phase1_opponent: OpponentKind::Random,
            phase2: Phase2Schedule::default(),
            phase3_opponent: OpponentKind::Minimax,
        }
    }
}

/// Stats of one merged training iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    pub phase: CurriculumPhase,
    /// 1-based within the phase
    pub iteration: usize,
    pub opponent: OpponentKind,
    pub epsilon: f64,
    pub stats: GameStats,
    pub transitions_applied: usize,
    /// Value table size after the merge
    pub table_size: usize,
}

/// Greedy play against every verification opponent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub games_per_opponent: usize,
    pub results: BTreeMap<OpponentKind, GameStats>,
    /// No losses against random or smart random
    pub perfect_vs_easy: bool,
    pub perfect_vs_minimax: bool,
}

impl VerificationReport {
    pub fn from_results(games_per_opponent: usize, results: BTreeMap<OpponentKind, GameStats>) -> Self {
        let no_losses = |kind: OpponentKind| results.get(&kind).is_some_and(|s| s.losses == 0);
        let perfect_vs_easy = no_losses(OpponentKind::Random) && no_losses(OpponentKind::SmartRandom);
        let perfect_vs_minimax = no_losses(OpponentKind::Minimax);
        Self {
            games_per_opponent,
            results,
            perfect_vs_easy,
            perfect_vs_minimax,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.perfect_vs_easy && self.perfect_vs_minimax
    }

    pub fn stats(&self, kind: OpponentKind) -> Option<&GameStats> {
        self.results.get(&kind)
    }
}

/// Totals for one phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub iterations: usize,
    pub stats: GameStats,
}

/// Outcome of a full curriculum run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumReport {
    pub phases: BTreeMap<CurriculumPhase, PhaseSummary>,
    pub checkpoints: Vec<VerificationReport>,
    /// Opponents trained against, in order of first appearance
    pub trained_against: Vec<OpponentKind>,
    /// Phase two hit zero losses at a checkpoint and phase three was skipped
    pub stopped_early: bool,
    pub final_verification: VerificationReport,
    pub table_size: usize,
}

impl CurriculumReport {
    pub fn is_perfect(&self) -> bool {
        self.final_verification.is_perfect()
    }

    /// Save report to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
