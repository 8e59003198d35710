//! Suggest command - ask one policy for a move

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};

use crate::{
    cli::output::{print_board, print_kv, print_subsection},
    game::{GameState, Move},
    heuristic::HeuristicEngine,
    mcts::{MctsConfig, MctsEngine, iteration_budget},
    minimax::MinimaxSearcher,
    ports::MovePolicy,
    q_learning::QLearningAgent,
    training::{RandomPolicy, SmartRandomPolicy},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    Minimax,
    Mcts,
    Rules,
    Random,
    #[value(alias = "smart_random")]
    SmartRandom,
    /// Learned Q-learning agent (needs --model)
    Q,
}

#[derive(Parser, Debug)]
#[command(about = "Suggest a move for a position")]
pub struct SuggestArgs {
    /// Board rows separated by '/', e.g. "X.O / .X. / ..O". Empty board when omitted
    #[arg(long, short = 'b')]
    pub board: Option<String>,

    /// Policy that picks the move
    #[arg(long, short = 'p', value_enum, default_value = "minimax")]
    pub policy: PolicyKind,

    /// Model snapshot for the q policy
    #[arg(long, short = 'm')]
    pub model: Option<PathBuf>,

    /// Board size when no --board is given
    #[arg(long, default_value_t = 3)]
    pub size: usize,

    /// Marks in a row needed to win
    #[arg(long, default_value_t = 3)]
    pub win: usize,

    /// MCTS iterations before budget scaling
    #[arg(long, default_value_t = 1000)]
    pub iterations: usize,

    /// Random seed
    #[arg(long, short = 's')]
    pub seed: Option<u64>,

    /// Write the minimax search tree as JSON to this file
    #[arg(long)]
    pub tree: Option<PathBuf>,
}

fn parse_state(args: &SuggestArgs) -> Result<GameState> {
    let state = match &args.board {
        Some(board) => GameState::from_string(board, args.win),
        None => GameState::new(args.size, args.win),
    };
    state.context("Invalid board")
}

pub fn execute(args: SuggestArgs) -> Result<()> {
    let state = parse_state(&args)?;
    print_subsection(&format!("Position ({} to move)", state.to_move()));
    print_board(&state);

    let choice = match args.policy {
        PolicyKind::Minimax => suggest_minimax(&args, &state)?,
        PolicyKind::Mcts => suggest_mcts(&args, &state),
        PolicyKind::Rules => HeuristicEngine::new().select_move(&state),
        PolicyKind::Random => RandomPolicy::new(args.seed).select_move(&state),
        PolicyKind::SmartRandom => SmartRandomPolicy::new(args.seed).select_move(&state),
        PolicyKind::Q => suggest_q(&args, &state)?,
    };

    let Some(mv) = choice else {
        println!("\nNo move available: the game is over.");
        return Ok(());
    };

    print_subsection(&format!("Suggested move: {mv}"));
    let after = state
        .after_move(mv)
        .ok_or_else(|| anyhow!("policy returned an illegal move {mv}"))?;
    print_board(&after);
    if let Some(outcome) = after.winner() {
        println!("\nResult: {outcome:?}");
    }
    Ok(())
}

fn suggest_minimax(args: &SuggestArgs, state: &GameState) -> Result<Option<Move>> {
    let searcher = MinimaxSearcher::new();
    let mut searcher = match args.seed {
        Some(seed) => searcher.with_seed(seed),
        None => searcher,
    };

    let Some(path) = &args.tree else {
        return Ok(searcher.best_move(state));
    };

    let (mv, tree) = searcher.best_move_with_tree(state, state.to_move());
    if let Some(tree) = tree {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer(file, &tree).context("Failed to write search tree")?;
        print_kv("Tree nodes", &tree.node_count().to_string());
        print_kv("Tree depth", &tree.max_depth().to_string());
    }
    Ok(mv)
}

fn suggest_mcts(args: &SuggestArgs, state: &GameState) -> Option<Move> {
    let engine = MctsEngine::new(MctsConfig::with_iterations(args.iterations));
    let mut engine = match args.seed {
        Some(seed) => engine.with_seed(seed),
        None => engine,
    };

    let budget = iteration_budget(state.empty_count(), args.iterations);
    let tree = engine.build_tree(state, budget);
    let mut stats = tree.root_statistics();
    stats.sort_by(|a, b| b.1.cmp(&a.1));
    for (mv, visits, score) in stats.iter().take(5) {
        print_kv(&mv.to_string(), &format!("{visits} visits, mean {score:.3}"));
    }
    tree.most_visited_move().or_else(|| engine.best_move(state))
}

fn suggest_q(args: &SuggestArgs, state: &GameState) -> Result<Option<Move>> {
    let path = args
        .model
        .as_ref()
        .ok_or_else(|| anyhow!("--model is required for the q policy"))?;
    let (agent, info) = QLearningAgent::from_snapshot(path)
        .with_context(|| format!("Failed to load model {}", path.display()))?;
    let mut agent = match args.seed {
        Some(seed) => agent.with_seed(seed),
        None => agent,
    };
    print_kv("Model entries", &info.q_table_size.to_string());

    let mut values = agent.move_values(state);
    values.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (mv, value) in values.iter().take(5) {
        print_kv(&mv.to_string(), &format!("{value:+.4}"));
    }
    Ok(agent.best_move(state))
}
