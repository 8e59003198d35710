//! Training observers
//!
//! Observers allow composable data collection during training without coupling
//! the trainer to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    ports::TrainingObserver,
    training::{GameStats, IterationReport, VerificationReport},
};

/// Progress bar observer - one tick per merged iteration
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    position: u64,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            position: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn stats_message(stats: &GameStats) -> String {
    format!("W:{} D:{} L:{}", stats.wins, stats.draws, stats.losses)
}

impl TrainingObserver for ProgressObserver {
    fn on_curriculum_start(&mut self, total_iterations: usize) -> Result<()> {
        let pb = ProgressBar::new(total_iterations as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} iterations ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        self.position = 0;
        Ok(())
    }

    fn on_iteration_end(&mut self, report: &IterationReport) -> Result<()> {
        self.position += 1;
        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.position);
            pb.set_message(format!(
                "{} vs {}: {}",
                report.phase,
                report.opponent,
                stats_message(&report.stats)
            ));
        }
        Ok(())
    }

    fn on_verification(&mut self, report: &VerificationReport) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            let verdict = if report.is_perfect() { "no losses" } else { "losses remain" };
            pb.println(format!("verification ({} games each): {verdict}", report.games_per_opponent));
        }
        Ok(())
    }

    fn on_curriculum_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("done");
        }
        Ok(())
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub iterations: usize,
    pub verifications: usize,
    pub totals: GameStats,
    /// Win rate of the most recent iteration
    pub last_win_rate: f64,
    pub table_size: usize,
    pub finished: bool,
}

#[derive(Debug, Default)]
struct MetricsState {
    history: Vec<IterationReport>,
    verifications: Vec<VerificationReport>,
    finished: bool,
}

/// Metrics observer - keeps the iteration history.
///
/// Clones share the same history, so a clone kept by the caller can be read
/// after the original has been handed to the trainer.
#[derive(Debug, Clone, Default)]
pub struct MetricsObserver {
    state: Arc<Mutex<MetricsState>>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn history(&self) -> Vec<IterationReport> {
        self.state().history.clone()
    }

    pub fn verifications(&self) -> Vec<VerificationReport> {
        self.state().verifications.clone()
    }

    pub fn summary(&self) -> MetricsSummary {
        let state = self.state();
        let mut totals = GameStats::default();
        for report in &state.history {
            totals += report.stats;
        }
        let last = state.history.last();
        MetricsSummary {
            iterations: state.history.len(),
            verifications: state.verifications.len(),
            totals,
            last_win_rate: last.map_or(0.0, |r| r.stats.win_rate()),
            table_size: last.map_or(0, |r| r.table_size),
            finished: state.finished,
        }
    }
}

impl TrainingObserver for MetricsObserver {
    fn on_curriculum_start(&mut self, _total_iterations: usize) -> Result<()> {
        let mut state = self.state();
        state.history.clear();
        state.verifications.clear();
        state.finished = false;
        Ok(())
    }

    fn on_iteration_end(&mut self, report: &IterationReport) -> Result<()> {
        self.state().history.push(report.clone());
        Ok(())
    }

    fn on_verification(&mut self, report: &VerificationReport) -> Result<()> {
        self.state().verifications.push(report.clone());
        Ok(())
    }

    fn on_curriculum_end(&mut self) -> Result<()> {
        self.state().finished = true;
        Ok(())
    }
}

/// JSONL observer - writes every iteration report as one JSON line
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create history file {}", path.display()), e))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TrainingObserver for JsonlObserver {
    fn on_iteration_end(&mut self, report: &IterationReport) -> Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::training::{CurriculumPhase, OpponentKind};

    fn report(iteration: usize, wins: usize, losses: usize) -> IterationReport {
        IterationReport {
            phase: CurriculumPhase::Exploration,
            iteration,
            opponent: OpponentKind::Random,
            epsilon: 0.9,
            stats: GameStats {
                wins,
                draws: 0,
                losses,
            },
            transitions_applied: 12,
            table_size: 10 * iteration,
        }
    }

    #[test]
    fn test_metrics_shared_between_clones() -> Result<()> {
        let handle = MetricsObserver::new();
        let mut boxed: Box<dyn TrainingObserver> = Box::new(handle.clone());

        boxed.on_curriculum_start(2)?;
        boxed.on_iteration_end(&report(1, 3, 1))?;
        boxed.on_iteration_end(&report(2, 4, 0))?;
        boxed.on_verification(&VerificationReport::from_results(1, BTreeMap::new()))?;
        boxed.on_curriculum_end()?;

        let summary = handle.summary();
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.verifications, 1);
        assert_eq!(summary.totals.wins, 7);
        assert_eq!(summary.totals.losses, 1);
        assert_eq!(summary.last_win_rate, 1.0);
        assert_eq!(summary.table_size, 20);
        assert!(summary.finished);
        assert_eq!(handle.history()[0].iteration, 1);
        Ok(())
    }

    #[test]
    fn test_progress_observer_runs_headless() -> Result<()> {
        let mut observer = ProgressObserver::new();
        observer.on_curriculum_start(1)?;
        observer.on_iteration_end(&report(1, 1, 0))?;
        observer.on_curriculum_end()?;
        Ok(())
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_iteration() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("history.jsonl");
        let mut observer = JsonlObserver::new(&path)?;
        observer.on_iteration_end(&report(1, 2, 0))?;
        observer.on_iteration_end(&report(2, 2, 1))?;

        let text = std::fs::read_to_string(&path)?;
        let lines: Vec<IterationReport> = text
            .lines()
            .map(serde_json::from_str)
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(lines, vec![report(1, 2, 0), report(2, 2, 1)]);
        Ok(())
    }
}
