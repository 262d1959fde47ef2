//! Persistence tests against real files.
//!
//! Each test uses its own file under the system temp directory.

use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use smile_score::{Config, FileStore, MilestoneReplay, ScoreEngine, ScoreError, ScoreStore};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 4, 10, 0, 0).unwrap()
}

fn at_secs(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Unique score file path for a test.
fn score_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("smile_score_it_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::remove_file(&path).ok();
    path
}

/// Tests that a persisted score reloads exactly.
#[test]
fn test_persist_and_reload_round_trip() {
    let path = score_path("round_trip.txt");
    std::fs::write(&path, "537.25").unwrap();

    let mut engine = ScoreEngine::new(FileStore::new(&path), t0());
    assert!((engine.score() - 537.25).abs() < 1e-9);
    engine.persist_now(t0()).unwrap();

    let reloaded = ScoreEngine::new(FileStore::new(&path), t0());
    assert!((reloaded.score() - 537.25).abs() < 1e-9);

    std::fs::remove_file(&path).ok();
}

/// Tests that a corrupt score file degrades to zero and is repaired on the next save.
#[test]
fn test_corrupt_store_recovers_to_zero() {
    let path = score_path("corrupt.txt");
    std::fs::write(&path, "🙂 lots of points").unwrap();

    let mut engine = ScoreEngine::new(FileStore::new(&path), t0());
    assert!(engine.score().abs() < f64::EPSILON);

    engine.tick(true, at_secs(0));
    engine.tick(true, at_secs(2));
    engine.persist_now(at_secs(2)).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "50");

    std::fs::remove_file(&path).ok();
}

/// Tests that a missing score file starts a fresh tracker.
#[test]
fn test_missing_store_starts_fresh() {
    let path = score_path("never_written.txt");
    let engine = ScoreEngine::new(FileStore::new(&path), t0());
    assert!(engine.score().abs() < f64::EPSILON);
    assert!(!path.exists());
}

/// Tests the periodic save cadence against a real file.
#[test]
fn test_periodic_saves_follow_interval() {
    let path = score_path("periodic.txt");
    let mut engine = ScoreEngine::new(FileStore::new(&path), t0());
    let interval = std::time::Duration::from_secs(3);

    let mut writes = Vec::new();
    for second in 0..=10 {
        engine.tick(true, at_secs(second));
        if engine.persist_if_due(at_secs(second), interval).unwrap() {
            writes.push(second);
        }
    }

    assert_eq!(writes, vec![3, 6, 9]);
    // Saved at 9s, after 9 seconds of smiling
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "225");
    assert!((engine.score() - 250.0).abs() < 1e-9);

    std::fs::remove_file(&path).ok();
}

/// Tests that an unwritable store is reported and the session continues in memory.
#[test]
fn test_unwritable_store_keeps_running() {
    let blocker = score_path("blocker_file");
    std::fs::write(&blocker, "").unwrap();
    let mut engine = ScoreEngine::new(FileStore::new(blocker.join("score.txt")), t0());

    engine.tick(true, at_secs(0));
    engine.tick(true, at_secs(4));
    let err = engine
        .persist_if_due(at_secs(4), std::time::Duration::from_secs(3))
        .unwrap_err();
    assert!(matches!(err, ScoreError::PersistFailed { .. }));

    let result = engine.tick(true, at_secs(5));
    assert!((result.score - 125.0).abs() < 1e-9);
    assert!(engine.persist_now(at_secs(5)).is_err());

    std::fs::remove_file(&blocker).ok();
}

/// Tests the restart behaviour of both milestone replay policies.
#[test]
fn test_restart_milestone_policies() {
    let path = score_path("restart.txt");
    let mut first_run = ScoreEngine::new(FileStore::new(&path), t0());
    first_run.tick(true, at_secs(0));
    let result = first_run.tick(true, at_secs(9));
    assert_eq!(result.newly_achieved.len(), 2);
    first_run.persist_now(at_secs(9)).unwrap();

    // Default policy: 225 points reloaded, 100 and 200 stay quiet
    let mut quiet = ScoreEngine::new(FileStore::new(&path), t0());
    assert!(quiet.tick(true, at_secs(0)).newly_achieved.is_empty());
    let next = quiet.tick(true, at_secs(4));
    let values: Vec<u64> = next.newly_achieved.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![300]);

    // Replay policy: both are announced again, once
    let config = Config {
        milestone_replay: MilestoneReplay::OnFirstTick,
        ..Config::default()
    };
    let mut replaying = ScoreEngine::from_config(FileStore::new(&path), &config, t0()).unwrap();
    let first = replaying.tick(false, at_secs(0));
    let values: Vec<u64> = first.newly_achieved.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![100, 200]);
    assert!(replaying.tick(false, at_secs(1)).newly_achieved.is_empty());

    std::fs::remove_file(&path).ok();
}

/// Tests that saving never leaves a temp file next to the score.
#[test]
fn test_atomic_save_leaves_single_file() {
    let dir = std::env::temp_dir().join(format!("smile_score_atomic_{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    let path = dir.join("score.txt");

    let mut store = FileStore::new(&path);
    for score in [1.0, 2.5, 1234.5] {
        store.save(score).unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("score.txt")]);
    assert_eq!(store.load().unwrap().as_deref(), Some("1234.5"));

    std::fs::remove_dir_all(&dir).ok();
}
