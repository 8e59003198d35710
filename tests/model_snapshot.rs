//! Snapshot persistence of trained agents

use kinarow::{
    Error,
    game::{GameState, Move},
    q_learning::{ModelMetadata, QLearningAgent, SavedModel},
    training::{OpponentKind, ParallelTrainer, TrainerConfig, snapshot_metadata},
};
use tempfile::TempDir;

fn small_config() -> TrainerConfig {
    TrainerConfig {
        games_per_iteration: 400,
        workers: 2,
        seed: Some(31),
        warm_up_games: 50,
        phase1_iterations: 3,
        phase2_iterations: 4,
        phase3_iterations: 2,
        verify_every: 2,
        verify_games: 20,
        final_verify_games: 30,
        ..TrainerConfig::default()
    }
}

#[test]
fn trained_model_roundtrips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.msgpack");

    let mut trainer = ParallelTrainer::new(small_config()).unwrap();
    let mut agent = trainer.new_agent();
    let report = trainer.run_curriculum(&mut agent).unwrap();
    let saved = agent.save_snapshot(&path, snapshot_metadata(&report)).unwrap();

    let (mut restored, info) = QLearningAgent::from_snapshot(&path).unwrap();
    assert_eq!(info, saved);
    assert_eq!(info.q_table_size, agent.table().len());
    assert_eq!(info.is_perfect, report.is_perfect());
    assert_eq!(restored.table().learning_rate(), agent.table().learning_rate());

    // Same greedy values from the restored table on every opening reply.
    let opening = GameState::standard();
    for mv in opening.legal_moves() {
        let reply = opening.after_move(mv).unwrap();
        assert_eq!(restored.move_values(&reply), agent.move_values(&reply));
    }
    assert!(restored.best_move(&opening).is_some());
}

#[test]
fn perfect_flag_implies_no_verification_losses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.msgpack");

    let mut trainer = ParallelTrainer::new(small_config()).unwrap();
    let mut agent = trainer.new_agent();
    let report = trainer.run_curriculum(&mut agent).unwrap();
    agent.save_snapshot(&path, snapshot_metadata(&report)).unwrap();

    let info = SavedModel::load_from_file(&path).unwrap().info();
    if info.is_perfect {
        let final_results = &report.final_verification;
        for kind in [OpponentKind::Random, OpponentKind::SmartRandom, OpponentKind::Minimax] {
            assert_eq!(final_results.stats(kind).unwrap().losses, 0, "{kind} losses");
        }
    } else {
        assert!(
            [OpponentKind::Random, OpponentKind::SmartRandom, OpponentKind::Minimax]
                .iter()
                .any(|&kind| report.final_verification.stats(kind).unwrap().losses > 0)
        );
    }
}

#[test]
fn failed_load_leaves_a_usable_empty_agent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.msgpack");
    std::fs::write(&path, [0xc1, 0x00, 0xff]).unwrap();

    let mut agent = QLearningAgent::default().with_seed(4);
    agent
        .table_mut()
        .set(GameState::standard().canonical_key(), Move::new(1, 1), 0.5);

    let err = agent.load_snapshot(&path).unwrap_err();
    assert!(matches!(err, Error::SnapshotDecode(_)));
    assert!(agent.table().is_empty());
    assert!(agent.best_move(&GameState::standard()).is_some());

    let err = agent.load_snapshot(dir.path().join("missing.msgpack")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn snapshot_metadata_is_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("meta.msgpack");
    let metadata = ModelMetadata {
        training_method: "hand-made".to_string(),
        is_perfect: false,
        trained_against: vec![OpponentKind::SelfPlay, OpponentKind::Rules],
    };
    QLearningAgent::default().save_snapshot(&path, metadata).unwrap();

    let info = SavedModel::load_from_file(&path).unwrap().info();
    assert_eq!(info.training_method, "hand-made");
    assert_eq!(info.q_table_size, 0);
    assert_eq!(info.trained_against, vec![OpponentKind::SelfPlay, OpponentKind::Rules]);
}
