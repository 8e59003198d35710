//! Parallel curriculum training for the Q-learning agent
//!
//! A [`ParallelTrainer`] runs the warm-up against minimax followed by three
//! phases of batched games. Workers play from a borrowed snapshot of the
//! value table and return their transitions; the coordinator merges them
//! sequentially before the next batch starts.
//!
//! ```no_run
//! use kinarow::training::{ParallelTrainer, TrainerConfig, snapshot_metadata};
//!
//! # fn main() -> kinarow::Result<()> {
//! let mut trainer = ParallelTrainer::new(TrainerConfig::default())?;
//! let mut agent = trainer.new_agent();
//! let report = trainer.run_curriculum(&mut agent)?;
//! agent.save_snapshot("model.msgpack", snapshot_metadata(&report))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod curriculum;
pub mod opponent;
pub mod trainer;
pub mod worker;

pub use config::{Phase2Config, ScheduleEntry, TrainerConfig};
pub use curriculum::{
    CurriculumPhase, CurriculumPlan, CurriculumReport, IterationReport, Phase2Schedule, PhaseSummary,
    VerificationReport, phase2_schedule,
};
pub use opponent::{MCTS_OPPONENT_ITERATIONS, Opponent, OpponentKind, RandomPolicy, SmartRandomPolicy};
pub use trainer::{ParallelTrainer, snapshot_metadata};
pub use worker::{BatchJob, BatchResult, GameStats, play_batch};
