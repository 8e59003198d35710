//! Trainer configuration

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use super::{
    curriculum::{CurriculumPlan, Phase2Schedule},
    opponent::OpponentKind,
};
use crate::{
    Error, Result,
    q_learning::{DEFAULT_DISCOUNT_FACTOR, DEFAULT_LEARNING_RATE},
};

/// Opponent by name and the exploration rate to play it at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub opponent: String,
    pub epsilon: f64,
}

impl ScheduleEntry {
    fn resolve(&self) -> Result<(OpponentKind, f64)> {
        Ok((self.opponent.parse()?, self.epsilon))
    }
}

impl From<(OpponentKind, f64)> for ScheduleEntry {
    fn from((opponent, epsilon): (OpponentKind, f64)) -> Self {
        Self {
            opponent: opponent.label().to_string(),
            epsilon,
        }
    }
}

/// Phase-two schedule as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase2Config {
    /// Last iteration played against `opening`
    pub opening_until: usize,
    pub opening: ScheduleEntry,
    /// Last iteration played against `middle`
    pub middle_until: usize,
    pub middle: ScheduleEntry,
    /// Later iterations cycle through these by iteration number
    pub rotation: Vec<ScheduleEntry>,
}

impl Default for Phase2Config {
    fn default() -> Self {
        let schedule = Phase2Schedule::default();
        Self {
            opening_until: schedule.opening_until,
            opening: schedule.opening.into(),
            middle_until: schedule.middle_until,
            middle: schedule.middle.into(),
            rotation: schedule.rotation.into_iter().map(ScheduleEntry::from).collect(),
        }
    }
}

impl Phase2Config {
    pub fn resolve(&self) -> Result<Phase2Schedule> {
        if self.opening_until > self.middle_until {
            return Err(invalid(&format!(
                "phase2.opening_until ({}) must not exceed phase2.middle_until ({})",
                self.opening_until, self.middle_until
            )));
        }
        if self.rotation.is_empty() {
            return Err(invalid("phase2.rotation needs at least one entry"));
        }
        let entries = [("phase2.opening", &self.opening), ("phase2.middle", &self.middle)]
            .into_iter()
            .chain(self.rotation.iter().map(|entry| ("phase2.rotation", entry)));
        for (name, entry) in entries {
            check_unit(&format!("{name} epsilon"), entry.epsilon)?;
        }

        Ok(Phase2Schedule {
            opening_until: self.opening_until,
            opening: self.opening.resolve()?,
            middle_until: self.middle_until,
            middle: self.middle.resolve()?,
            rotation: self
                .rotation
                .iter()
                .map(ScheduleEntry::resolve)
                .collect::<Result<_>>()?,
        })
    }
}

/// Knobs for the parallel curriculum.
///
/// Every field has a default, so a JSON file only needs the values it
/// changes:
///
/// ```
/// use kinarow::training::TrainerConfig;
///
/// let config: TrainerConfig = serde_json::from_str(r#"{ "games_per_iteration": 200, "seed": 7 }"#).unwrap();
/// assert_eq!(config.games_per_iteration, 200);
/// assert_eq!(config.phase1_iterations, 20);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Games per training iteration, split across workers
    pub games_per_iteration: usize,

    /// Worker threads in the trainer's pool
    pub workers: usize,

    /// Base seed; workers derive their own streams from it
    pub seed: Option<u64>,

    /// Sequential games against minimax before phase one
    pub warm_up_games: usize,
    pub warm_up_epsilon: f64,

    /// Phase one: broad exploration, against the random opponent by default
    pub phase1_iterations: usize,
    pub phase1_opponent: String,
    pub phase1_epsilon: f64,

    /// Phase two: mixed opponents on a schedule
    pub phase2_iterations: usize,
    pub phase2: Phase2Config,

    /// Phase three: correction, against minimax by default, at a lower
    /// learning rate
    pub phase3_iterations: usize,
    pub phase3_opponent: String,
    pub phase3_epsilon: f64,
    pub phase3_learning_rate: f64,

    /// Run a checkpoint verification every this many phase-two iterations
    pub verify_every: usize,
    /// Games per opponent at a checkpoint
    pub verify_games: usize,
    /// Games per opponent in the closing verification
    pub final_verify_games: usize,

    pub learning_rate: f64,
    pub discount_factor: f64,

    /// Let the rule cascade override the agent's own choices
    pub use_rules: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            games_per_iteration: 5_000,
            workers: default_workers(),
            seed: None,
            warm_up_games: 500,
            warm_up_epsilon: 0.8,
            phase1_iterations: 20,
            phase1_opponent: OpponentKind::Random.label().to_string(),
            phase1_epsilon: 0.9,
            phase2_iterations: 40,
            phase2: Phase2Config::default(),
            phase3_iterations: 10,
            phase3_opponent: OpponentKind::Minimax.label().to_string(),
            phase3_epsilon: 0.05,
            phase3_learning_rate: 0.1,
            verify_every: 10,
            verify_games: 500,
            final_verify_games: 2_000,
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            use_rules: false,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl TrainerConfig {
    /// Load from a JSON file. Missing fields take their defaults; unknown
    /// opponent names fail with [`Error::UnknownOpponent`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open trainer config {}", path.display()), e))?;
        let config: TrainerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create trainer config {}", path.display()), e))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        if self.games_per_iteration == 0 {
            return Err(invalid("games_per_iteration must be at least 1"));
        }
        if self.verify_every == 0 {
            return Err(invalid("verify_every must be at least 1"));
        }

        let unit_values = [
            ("warm_up_epsilon", self.warm_up_epsilon),
            ("phase1_epsilon", self.phase1_epsilon),
            ("phase3_epsilon", self.phase3_epsilon),
            ("learning_rate", self.learning_rate),
            ("phase3_learning_rate", self.phase3_learning_rate),
            ("discount_factor", self.discount_factor),
        ];
        for (name, value) in unit_values {
            check_unit(name, value)?;
        }

        self.plan().map(|_| ())
    }

    /// Opponents for every phase, with names resolved.
    pub fn plan(&self) -> Result<CurriculumPlan> {
        Ok(CurriculumPlan {
            phase1_opponent: self.phase1_opponent.parse()?,
            phase2: self.phase2.resolve()?,
            phase3_opponent: self.phase3_opponent.parse()?,
        })
    }

    /// Iterations across all three phases, warm-up excluded.
    pub fn total_iterations(&self) -> usize {
        self.phase1_iterations + self.phase2_iterations + self.phase3_iterations
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(&format!("{name} must be within [0, 1], got {value}")))
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfiguration {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = TrainerConfig::default();
        config.validate().unwrap();
        assert!(config.workers >= 1);
        assert_eq!(config.total_iterations(), 70);
    }

    #[test]
    fn test_rejects_zero_workers_and_games() {
        let config = TrainerConfig {
            workers: 0,
            ..TrainerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));

        let config = TrainerConfig {
            games_per_iteration: 0,
            ..TrainerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_epsilon_out_of_range() {
        let config = TrainerConfig {
            phase1_epsilon: 1.5,
            ..TrainerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("phase1_epsilon"));
    }

    #[test]
    fn test_save_load_json() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("trainer.json");
        let config = TrainerConfig {
            games_per_iteration: 64,
            workers: 2,
            seed: Some(9),
            ..TrainerConfig::default()
        };
        config.save(&path)?;
        assert_eq!(TrainerConfig::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "workers": 0 }"#)?;
        assert!(matches!(
            TrainerConfig::load(&path),
            Err(Error::InvalidConfiguration { .. })
        ));

        std::fs::write(&path, "not json")?;
        assert!(matches!(TrainerConfig::load(&path), Err(Error::Serialization(_))));
        Ok(())
    }

    #[test]
    fn test_default_plan_matches_curriculum() {
        let plan = TrainerConfig::default().plan().unwrap();
        assert_eq!(plan, CurriculumPlan::default());
        assert_eq!(plan.phase2.entry(26), (OpponentKind::SelfPlay, 0.2));
    }

    #[test]
    fn test_load_rejects_unknown_opponent() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("opponent.json");
        std::fs::write(&path, r#"{ "phase1_opponent": "grandmaster" }"#)?;
        let err = TrainerConfig::load(&path).unwrap_err();
        assert!(matches!(&err, Error::UnknownOpponent { name, .. } if name == "grandmaster"));

        std::fs::write(
            &path,
            r#"{ "phase2": { "rotation": [{ "opponent": "rules", "epsilon": 0.1 }, { "opponent": "nobody", "epsilon": 0.1 }] } }"#,
        )?;
        assert!(matches!(TrainerConfig::load(&path), Err(Error::UnknownOpponent { .. })));
        Ok(())
    }

    #[test]
    fn test_load_custom_opponents_and_boundaries() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{
                "phase1_opponent": "smart_random",
                "phase3_opponent": "mcts",
                "phase2": {
                    "opening_until": 4,
                    "opening": { "opponent": "reguly", "epsilon": 0.4 },
                    "middle_until": 6,
                    "rotation": [{ "opponent": "self", "epsilon": 0.2 }]
                }
            }"#,
        )?;
        let plan = TrainerConfig::load(&path)?.plan()?;
        assert_eq!(plan.phase1_opponent, OpponentKind::SmartRandom);
        assert_eq!(plan.phase3_opponent, OpponentKind::Mcts);
        assert_eq!(plan.phase2.entry(4), (OpponentKind::Rules, 0.4));
        // Middle stage keeps its default.
        assert_eq!(plan.phase2.entry(5), (OpponentKind::SelfPlay, 0.25));
        assert_eq!(plan.phase2.entry(7), (OpponentKind::SelfPlay, 0.2));
        Ok(())
    }

    #[test]
    fn test_rejects_bad_phase2_schedule() {
        let mut config = TrainerConfig::default();
        config.phase2.opening_until = 30;
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration { .. })));

        let mut config = TrainerConfig::default();
        config.phase2.rotation.clear();
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.phase2.middle.epsilon = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("phase2.middle"));
    }
}
