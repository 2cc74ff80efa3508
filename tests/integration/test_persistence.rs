//! Persistence tests across crates: save slots, level files and statistics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use roboyard_core::{
    parse_board, serialize_board, Color, CompletionRecord, Config, Direction, FileSessionStore,
    LevelDirectory, LevelSource, Position, RandomBoardGenerator, RoboyardError, SessionController,
    SessionKind, SessionPhase, SessionStore,
};
use roboyard_solver::{BreadthFirstSolver, WorkerSolverPort};
use roboyard_stats::{CompletionStore, MarkdownSummary};

fn levels_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/levels")
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "roboyard-integration-{name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn controller(save_dir: &Path) -> SessionController {
    SessionController::new(
        &Config::default(),
        Box::new(RandomBoardGenerator::seeded(3)),
        Box::new(WorkerSolverPort::new(BreadthFirstSolver::default())),
    )
    .with_levels(Box::new(LevelDirectory::new(levels_dir())))
    .with_store(Box::new(FileSessionStore::new(save_dir)))
}

#[test]
fn test_fixture_levels_roundtrip_through_notation() {
    let levels = LevelDirectory::new(levels_dir());
    for id in [1, 2] {
        let board = levels.level(id).unwrap();
        let reparsed = parse_board(&serialize_board(&board)).unwrap();
        assert_eq!(reparsed, board, "level {id}");
    }
}

#[test]
fn test_missing_level_is_reported() {
    let levels = LevelDirectory::new(levels_dir());
    let err = levels.level(404).unwrap_err();
    assert!(matches!(err, RoboyardError::LevelNotFound { id: 404, .. }));
}

#[tokio::test]
async fn test_saved_game_resumes_mid_play() {
    let dir = temp_dir("resume");
    let mut session = controller(&dir);

    session.load_level(2).unwrap();
    session.settle().await;
    session.try_move(Color::Red, Direction::South).unwrap();
    session.save(1, "halfway").unwrap();
    assert!(FileSessionStore::new(&dir).slot_path(1).exists());

    let mut resumed = controller(&dir);
    resumed.load_saved(1).unwrap();
    assert_eq!(resumed.kind(), Some(SessionKind::Saved { slot: 1 }));
    assert_eq!(resumed.phase(), SessionPhase::Active);
    assert_eq!(
        resumed.board().unwrap().robot(Color::Red).unwrap().position,
        Position::new(4, 4)
    );
    assert_eq!(resumed.metrics().move_count, 0);

    resumed.settle().await;
    assert_eq!(resumed.solution().map(|s| s.len()), Some(1));
    let outcome = resumed.try_move(Color::Red, Direction::West).unwrap();
    assert!(outcome.completed);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_snapshot_file_keeps_metadata() {
    let dir = temp_dir("metadata");
    let store = FileSessionStore::new(&dir);
    let board = LevelDirectory::new(levels_dir()).level(1).unwrap();
    let snapshot = roboyard_core::SessionSnapshot {
        name: "corner".to_string(),
        level_id: Some(1),
        tier: None,
        board,
        move_count: 4,
        hints_shown: 1,
        elapsed_ms: 12_500,
        saved_at: Utc::now(),
    };

    store.save(3, &snapshot).unwrap();
    let loaded = store.load(3).unwrap().unwrap();
    assert_eq!(loaded.name, "corner");
    assert_eq!(loaded.level_id, Some(1));
    assert_eq!(loaded.move_count, 4);
    assert_eq!(loaded.board, snapshot.board);
    assert!(store.load(4).unwrap().is_none());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_statistics_survive_restart() {
    let dir = temp_dir("stats");
    let stats_path = dir.join("stats.json");

    let stats = Arc::new(CompletionStore::open(&stats_path).unwrap());
    let mut session = controller(&dir.join("saves")).with_statistics(stats.clone());
    session.load_level(1).unwrap();
    session.settle().await;
    session.try_move(Color::Red, Direction::South).unwrap();
    session.try_move(Color::Red, Direction::East).unwrap();
    assert!(session.is_complete());
    drop(session);

    let reopened = CompletionStore::open(&stats_path).unwrap();
    assert_eq!(reopened.total_stars(), 3);
    assert_eq!(reopened.levels_completed(), 1);

    // a worse run does not replace the best
    reopened.record(&CompletionRecord {
        level_id: Some(1),
        stars: 1,
        moves_used: 4,
        optimal_moves: 2,
        hints_used: 0,
        time_ms: 1_000,
        robots_used: 1,
        completed_at: Utc::now(),
    });
    assert_eq!(reopened.best(1).unwrap().stars, 3);

    let markdown = MarkdownSummary::new(&reopened.snapshot()).generate();
    assert!(markdown.contains("| 1 | ★★★☆ | 2 | 2 | 0 |"));

    std::fs::remove_dir_all(&dir).unwrap();
}
