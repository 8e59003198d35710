//! Inspect command - print snapshot metadata

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section},
    q_learning::SavedModel,
};

#[derive(Parser, Debug)]
#[command(about = "Show metadata of a saved model")]
pub struct InspectArgs {
    /// Model snapshot file
    #[arg(long, short = 'm')]
    pub model: PathBuf,

    /// Print the metadata as JSON instead
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let model = SavedModel::load_from_file(&args.model)
        .with_context(|| format!("Failed to load model {}", args.model.display()))?;
    let info = model.info();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let trained_against: Vec<&str> = info.trained_against.iter().map(|k| k.label()).collect();
    print_section(&format!("Model {}", args.model.display()));
    print_kv("Version", &info.version.to_string());
    print_kv("Training method", &info.training_method);
    print_kv("Perfect", &info.is_perfect.to_string());
    print_kv("Board size", &format!("{0}x{0}", info.board_size));
    print_kv("Q-table size", &format_number(info.q_table_size));
    print_kv("Timestamp", &info.timestamp.to_string());
    print_kv("Trained against", &trained_against.join(", "));
    print_kv("Learning rate", &info.learning_rate.to_string());
    print_kv("Discount factor", &info.discount_factor.to_string());
    Ok(())
}
