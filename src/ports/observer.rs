//! Observer port - abstraction for watching a curriculum run
//!
//! Observers receive coordinator-side events only. Workers never see them,
//! so implementations do not need to be thread-safe beyond `Send`.

use crate::{
    Result,
    training::{IterationReport, VerificationReport},
};

/// Observer trait for monitoring curriculum training
///
/// # Event Sequence
///
/// 1. `on_curriculum_start(total_iterations)` - once
/// 2. `on_iteration_end(report)` - after each merged batch
/// 3. `on_verification(report)` - after each checkpoint verification
/// 4. `on_curriculum_end()` - once
///
/// # Examples
///
/// ```no_run
/// use kinarow::{ports::TrainingObserver, training::IterationReport};
///
/// struct LossCounter {
///     losses: usize,
/// }
///
/// impl TrainingObserver for LossCounter {
///     fn on_iteration_end(&mut self, report: &IterationReport) -> kinarow::Result<()> {
///         self.losses += report.stats.losses;
///         Ok(())
///     }
/// }
/// ```
pub trait TrainingObserver: Send {
    /// Called before the first batch with the number of planned iterations.
    fn on_curriculum_start(&mut self, _total_iterations: usize) -> Result<()> {
        Ok(())
    }

    /// Called after a batch has been merged into the value table.
    fn on_iteration_end(&mut self, _report: &IterationReport) -> Result<()> {
        Ok(())
    }

    /// Called after a checkpoint or final verification.
    fn on_verification(&mut self, _report: &VerificationReport) -> Result<()> {
        Ok(())
    }

    /// Called once the curriculum finishes or stops early.
    fn on_curriculum_end(&mut self) -> Result<()> {
        Ok(())
    }
}
