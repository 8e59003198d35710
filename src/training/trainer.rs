//! Parallel curriculum trainer
//!
//! Each iteration hands every worker the same borrowed value table, joins
//! their batches, then applies all transitions on the coordinator in
//! worker order. The table is never written while a batch is running.

use std::collections::BTreeMap;

use rand::{Rng, rngs::StdRng};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use tracing::{debug, info};

use super::{
    config::TrainerConfig,
    curriculum::{CurriculumPhase, CurriculumPlan, CurriculumReport, IterationReport, PhaseSummary, VerificationReport},
    opponent::OpponentKind,
    worker::{BatchJob, BatchResult, GameStats, play_batch},
};
use crate::{
    Error, Result,
    game::{GameState, Player},
    minimax::MinimaxSearcher,
    ports::TrainingObserver,
    q_learning::{ModelMetadata, QLearningAgent, QTable},
    utils::{build_rng, derive_seed},
};

/// Curriculum trainer owning a dedicated rayon pool
pub struct ParallelTrainer {
    config: TrainerConfig,
    plan: CurriculumPlan,
    pool: ThreadPool,
    observers: Vec<Box<dyn TrainingObserver>>,
    rng: StdRng,
    /// Batches dispatched so far; salts the worker seeds
    batches: usize,
}

impl ParallelTrainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let plan = config.plan()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("kinarow-worker-{i}"))
            .build()
            .map_err(|e| Error::InvalidConfiguration {
                message: format!("failed to build worker pool: {e}"),
            })?;
        let rng = build_rng(config.seed);
        Ok(Self {
            config,
            plan,
            pool,
            observers: Vec::new(),
            rng,
            batches: 0,
        })
    }

    /// Add an observer to the trainer
    pub fn with_observer(mut self, observer: Box<dyn TrainingObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fresh agent with the configured learning and discount rates.
    pub fn new_agent(&self) -> QLearningAgent {
        let agent = QLearningAgent::new(self.config.learning_rate, self.config.discount_factor, 0.0);
        match self.config.seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        }
    }

    /// Split `games` across the workers, remainder to the first ones.
    fn jobs(&mut self, games: usize, opponent: OpponentKind, epsilon: f64, record: bool) -> Vec<BatchJob> {
        let workers = self.config.workers;
        let salt = self.batches;
        self.batches += 1;

        (0..workers)
            .map(|worker| BatchJob {
                opponent,
                epsilon,
                games: games / workers + usize::from(worker < games % workers),
                seed: self.config.seed.map(|base| derive_seed(base, salt, worker)),
                use_rules: self.config.use_rules,
                record,
            })
            .filter(|job| job.games > 0)
            .collect()
    }

    fn run_batches(&self, table: &QTable, jobs: &[BatchJob]) -> Vec<BatchResult> {
        self.pool
            .install(|| jobs.par_iter().map(|job| play_batch(table, job)).collect())
    }

    /// One parallel training iteration followed by the sequential merge.
    pub fn run_iteration(
        &mut self,
        agent: &mut QLearningAgent,
        phase: CurriculumPhase,
        iteration: usize,
        games: usize,
        opponent: OpponentKind,
        epsilon: f64,
    ) -> Result<IterationReport> {
        let jobs = self.jobs(games, opponent, epsilon, true);
        let results = self.run_batches(agent.table(), &jobs);

        let mut stats = GameStats::default();
        let mut transitions_applied = 0;
        for (worker, result) in results.into_iter().enumerate() {
            debug!(
                worker,
                games = result.stats.games(),
                transitions = result.transitions.len(),
                "batch joined"
            );
            stats += result.stats;
            for transition in &result.transitions {
                agent.update(transition);
            }
            transitions_applied += result.transitions.len();
        }

        let report = IterationReport {
            phase,
            iteration,
            opponent,
            epsilon,
            stats,
            transitions_applied,
            table_size: agent.table().len(),
        };
        info!(
            %phase,
            iteration,
            %opponent,
            epsilon,
            wins = stats.wins,
            draws = stats.draws,
            losses = stats.losses,
            win_rate = format_args!("{:.1}%", stats.win_rate() * 100.0),
            table_size = report.table_size,
            "iteration finished"
        );

        for observer in &mut self.observers {
            observer.on_iteration_end(&report)?;
        }
        Ok(report)
    }

    /// Greedy play (ε = 0) against every verification opponent.
    pub fn verify(&mut self, agent: &QLearningAgent, games_per_opponent: usize) -> Result<VerificationReport> {
        let mut results = BTreeMap::new();
        for kind in OpponentKind::VERIFICATION {
            let jobs = self.jobs(games_per_opponent, kind, 0.0, false);
            let mut stats = GameStats::default();
            for result in self.run_batches(agent.table(), &jobs) {
                stats += result.stats;
            }
            info!(
                opponent = %kind,
                wins = stats.wins,
                draws = stats.draws,
                losses = stats.losses,
                passed = stats.losses == 0,
                "verification"
            );
            results.insert(kind, stats);
        }

        let report = VerificationReport::from_results(games_per_opponent, results);
        for observer in &mut self.observers {
            observer.on_verification(&report)?;
        }
        Ok(report)
    }

    /// Sequential games against minimax, learning after every game.
    ///
    /// The agent's side is drawn at random each game.
    pub fn warm_up(&mut self, agent: &mut QLearningAgent, games: usize) -> Result<IterationReport> {
        let mut expert = match self.config.seed {
            Some(seed) => MinimaxSearcher::new().with_seed(derive_seed(seed, usize::MAX, 0)),
            None => MinimaxSearcher::new(),
        };
        let epsilon = self.config.warm_up_epsilon;
        let use_rules = self.config.use_rules;
        let mut stats = GameStats::default();
        let mut transitions_applied = 0;

        for game in 0..games {
            let agent_player = if self.rng.random::<bool>() { Player::X } else { Player::O };
            let mut state = GameState::standard();
            let mut decisions = Vec::new();

            while !state.is_terminal() {
                let agent_turn = state.to_move() == agent_player;
                let choice = if agent_turn {
                    agent.select_action(&state, epsilon, true, use_rules)
                } else {
                    expert.best_move(&state)
                };
                let Some(mv) = choice else {
                    break;
                };
                let before = state.clone();
                if !state.apply_move(mv.row, mv.col) {
                    break;
                }
                if agent_turn {
                    decisions.push((before, mv));
                }
            }

            stats.record(state.winner(), agent_player);
            transitions_applied += agent.learn_episode(&decisions, &state, agent_player);

            if (game + 1) % 100 == 0 {
                debug!(game = game + 1, games, wins = stats.wins, draws = stats.draws, losses = stats.losses, "warm-up progress");
            }
        }

        let report = IterationReport {
            phase: CurriculumPhase::WarmUp,
            iteration: 1,
            opponent: OpponentKind::Minimax,
            epsilon,
            stats,
            transitions_applied,
            table_size: agent.table().len(),
        };
        info!(games, losses = stats.losses, table_size = report.table_size, "warm-up finished");
        for observer in &mut self.observers {
            observer.on_iteration_end(&report)?;
        }
        Ok(report)
    }

    /// Warm-up, the three phases and a final verification.
    ///
    /// Phase two stops early, and phase three is skipped, once a checkpoint
    /// shows no losses against the easy opponents and minimax.
    pub fn run_curriculum(&mut self, agent: &mut QLearningAgent) -> Result<CurriculumReport> {
        let config = self.config.clone();
        let plan = self.plan.clone();
        let warm_up = usize::from(config.warm_up_games > 0);
        for observer in &mut self.observers {
            observer.on_curriculum_start(config.total_iterations() + warm_up)?;
        }

        let mut tracker = Tracker::default();

        if config.warm_up_games > 0 {
            info!(games = config.warm_up_games, "warm-up against minimax");
            let report = self.warm_up(agent, config.warm_up_games)?;
            tracker.add(&report);
        }

        info!(opponent = %plan.phase1_opponent, "phase 1: broad exploration");
        for iteration in 1..=config.phase1_iterations {
            let report = self.run_iteration(
                agent,
                CurriculumPhase::Exploration,
                iteration,
                config.games_per_iteration,
                plan.phase1_opponent,
                config.phase1_epsilon,
            )?;
            tracker.add(&report);
        }

        info!("phase 2: mixed opponents");
        let mut stopped_early = false;
        for iteration in 1..=config.phase2_iterations {
            let (opponent, epsilon) = plan.phase2.entry(iteration);
            let report = self.run_iteration(
                agent,
                CurriculumPhase::Strategy,
                iteration,
                config.games_per_iteration,
                opponent,
                epsilon,
            )?;
            tracker.add(&report);

            if iteration % config.verify_every == 0 {
                let checkpoint = self.verify(agent, config.verify_games)?;
                let perfect = checkpoint.is_perfect();
                tracker.checkpoints.push(checkpoint);
                if perfect {
                    info!(iteration, "no losses at checkpoint, stopping phase 2 early");
                    stopped_early = true;
                    break;
                }
            }
        }

        if !stopped_early {
            info!(
                opponent = %plan.phase3_opponent,
                learning_rate = config.phase3_learning_rate,
                "phase 3: correction"
            );
            agent.table_mut().set_learning_rate(config.phase3_learning_rate);
            for iteration in 1..=config.phase3_iterations {
                let report = self.run_iteration(
                    agent,
                    CurriculumPhase::Correction,
                    iteration,
                    config.games_per_iteration,
                    plan.phase3_opponent,
                    config.phase3_epsilon,
                )?;
                tracker.add(&report);
            }
        }

        info!(games = config.final_verify_games, "final verification");
        let final_verification = self.verify(agent, config.final_verify_games)?;

        for observer in &mut self.observers {
            observer.on_curriculum_end()?;
        }

        let report = CurriculumReport {
            phases: tracker.phases,
            checkpoints: tracker.checkpoints,
            trained_against: tracker.trained_against,
            stopped_early,
            final_verification,
            table_size: agent.table().len(),
        };
        info!(
            is_perfect = report.is_perfect(),
            table_size = report.table_size,
            "curriculum finished"
        );
        Ok(report)
    }
}

/// Snapshot metadata describing a finished run.
pub fn snapshot_metadata(report: &CurriculumReport) -> ModelMetadata {
    ModelMetadata {
        is_perfect: report.is_perfect(),
        trained_against: report.trained_against.clone(),
        ..ModelMetadata::default()
    }
}

#[derive(Default)]
struct Tracker {
    phases: BTreeMap<CurriculumPhase, PhaseSummary>,
    checkpoints: Vec<VerificationReport>,
    trained_against: Vec<OpponentKind>,
}

impl Tracker {
    fn add(&mut self, report: &IterationReport) {
        let summary = self.phases.entry(report.phase).or_default();
        summary.iterations += 1;
        summary.stats += report.stats;
        if !self.trained_against.contains(&report.opponent) {
            self.trained_against.push(report.opponent);
        }
    }
}
