//! Train command - run the parallel curriculum and save a snapshot

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, format_stats, print_kv, print_section, print_subsection, print_verification},
    observers::{JsonlObserver, ProgressObserver},
    training::{CurriculumReport, ParallelTrainer, TrainerConfig, snapshot_metadata},
};

#[derive(Parser, Debug)]
#[command(about = "Train a Q-learning agent with the parallel curriculum")]
pub struct TrainArgs {
    /// JSON trainer configuration; flags below override it
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output file for the model snapshot
    #[arg(long, short = 'O', default_value = "model.msgpack")]
    pub output: PathBuf,

    /// Worker threads
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Games per training iteration
    #[arg(long, short = 'g')]
    pub games: Option<usize>,

    /// Random seed
    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Let the rule cascade override the agent during training
    #[arg(long)]
    pub use_rules: bool,

    /// Write one JSON line per iteration to this file
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Write the curriculum report as JSON to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl TrainArgs {
    fn trainer_config(&self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load(path)
                .with_context(|| format!("Failed to load trainer config {}", path.display()))?,
            None => TrainerConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(games) = self.games {
            config.games_per_iteration = games;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.use_rules |= self.use_rules;
        config.validate().context("Invalid trainer configuration")?;
        Ok(config)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = args.trainer_config()?;

    print_section("Q-learning curriculum");
    print_kv("Workers", &config.workers.to_string());
    print_kv("Games/iteration", &format_number(config.games_per_iteration));
    print_kv(
        "Iterations",
        &format!(
            "{} + {} + {}",
            config.phase1_iterations, config.phase2_iterations, config.phase3_iterations
        ),
    );
    if let Some(seed) = config.seed {
        print_kv("Seed", &seed.to_string());
    }

    let mut trainer = ParallelTrainer::new(config)?;
    if !args.no_progress {
        trainer = trainer.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.history {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create history file {}", path.display()))?;
        trainer = trainer.with_observer(Box::new(observer));
    }

    let mut agent = trainer.new_agent();
    let report = trainer.run_curriculum(&mut agent).context("Training failed")?;

    print_report(&report);

    let info = agent
        .save_snapshot(&args.output, snapshot_metadata(&report))
        .with_context(|| format!("Failed to save model to {}", args.output.display()))?;
    println!(
        "\nModel saved to {} ({} entries)",
        args.output.display(),
        format_number(info.q_table_size)
    );

    if let Some(path) = &args.summary {
        report
            .save(path)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    if report.is_perfect() {
        println!("\nNo losses against random, smart random or minimax in the final verification.");
    } else {
        println!("\nAgent still loses in the final verification; consider more iterations.");
    }
    Ok(())
}

fn print_report(report: &CurriculumReport) {
    print_subsection("Phases");
    for (phase, summary) in &report.phases {
        print_kv(
            phase.label(),
            &format!("{} it, {}", summary.iterations, format_stats(&summary.stats)),
        );
    }
    if report.stopped_early {
        println!("  (phase 3 skipped: checkpoint showed no losses)");
    }

    print_subsection("Final verification");
    print_verification(&report.final_verification);
    print_kv("Q-table size", &format_number(report.table_size));
}
