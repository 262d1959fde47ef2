//! End-to-end tests of the scoring state machine through the public API.
//!
//! These drive whole sessions of detector verdicts through the engine and
//! check the properties the presentation layer relies on.

use chrono::{DateTime, Duration, TimeZone, Utc};
use smile_score::{
    Config, MemoryStore, MilestoneReplay, ScoreEngine, SignalDetector, SignalLine, SmileDetector,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 4, 10, 0, 0).unwrap()
}

fn at_millis(ms: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(ms)
}

/// Feeds a recorded detection stream to an engine, returning every announced milestone value.
fn replay(engine: &mut ScoreEngine<MemoryStore>, recording: &str) -> Vec<u64> {
    let mut detector = SignalDetector;
    let mut announced = Vec::new();
    for raw in recording.lines() {
        let line = SignalLine::parse(raw);
        let offset = line.offset_secs.expect("recording lines carry timestamps");
        let now = t0() + Duration::milliseconds((offset * 1000.0).round() as i64);
        let result = engine.tick(detector.detect(line.verdict), now);
        announced.extend(result.newly_achieved.iter().map(|m| m.value));
    }
    announced
}

/// Tests the worked example: 95 points plus two seconds of smiling.
#[test]
fn test_reference_scenario_from_recording() {
    let mut engine = ScoreEngine::new(MemoryStore::with_contents("95"), t0());
    let announced = replay(&mut engine, "0 1\n1 1\n2 1\n");

    assert!((engine.score() - 145.0).abs() < 1e-9);
    assert_eq!(announced, vec![100]);
}

/// Tests that a 30 fps stream earns the same as its endpoints would.
#[test]
fn test_frame_rate_does_not_change_earnings() {
    let mut engine = ScoreEngine::new(MemoryStore::new(), t0());
    // 10 seconds at ~30 fps
    for frame in 0..=300 {
        engine.tick(true, at_millis(frame * 100 / 3));
    }
    assert!((engine.score() - 250.0).abs() < 1e-6);
}

/// Tests that flickering detection only pays for adjacent smiling frames.
#[test]
fn test_flickering_stream() {
    let mut engine = ScoreEngine::new(MemoryStore::new(), t0());
    let recording = "0 1\n0.5 1\n1 0\n1.5 1\n2 😊\n2.5 smile\n3 no\n";
    replay(&mut engine, recording);

    // Paid intervals: 0-0.5, 1.5-2, 2-2.5
    assert!((engine.score() - 37.5).abs() < 1e-9);
    assert!(!engine.state().is_smiling());
}

/// Tests that every milestone is announced once, in ascending order, over a long session.
#[test]
fn test_long_session_announces_each_milestone_once() {
    let mut engine = ScoreEngine::new(MemoryStore::new(), t0());
    let mut announced = Vec::new();

    // Two minutes of smiling with a dropped frame every 20 frames
    for frame in 0..3600_i64 {
        let smiling = frame % 20 != 0;
        let result = engine.tick(smiling, at_millis(frame * 100 / 3));
        announced.extend(result.newly_achieved.iter().map(|m| m.value));
    }

    assert!(announced.windows(2).all(|pair| pair[0] < pair[1]));
    let expected: Vec<u64> = engine
        .schedule()
        .as_slice()
        .iter()
        .map(|m| m.value)
        .take_while(|value| (*value as f64) <= engine.score())
        .collect();
    assert_eq!(announced, expected);
    assert_eq!(
        engine.state().achieved_milestones.iter().copied().collect::<Vec<_>>(),
        expected
    );
}

/// Tests an engine built from a JSON configuration.
#[test]
fn test_engine_from_json_config() {
    let config: Config = serde_json::from_str(
        r#"{
            "pointsPerSecond": 100,
            "milestoneReplay": "on_first_tick",
            "milestones": [
                { "from": 50, "to": 250, "step": 50, "message": "{points} already!" },
                { "from": 1000, "to": 5000, "step": 1000, "message": "Legendary {points}" }
            ]
        }"#,
    )
    .unwrap();
    config.validate().unwrap();
    assert_eq!(config.milestone_replay, MilestoneReplay::OnFirstTick);

    let mut engine =
        ScoreEngine::from_config(MemoryStore::with_contents("120"), &config, t0()).unwrap();

    // Replayed on the first tick because of on_first_tick
    let first = engine.tick(true, t0());
    let messages: Vec<&str> = first
        .newly_achieved
        .iter()
        .map(|m| m.message.as_str())
        .collect();
    assert_eq!(messages, vec!["50 already!", "100 already!"]);

    // 9 seconds at 100/s takes 120 to 1020
    let second = engine.tick(true, at_millis(9000));
    let values: Vec<u64> = second.newly_achieved.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![150, 200, 250, 1000]);
    assert_eq!(second.newly_achieved[3].message, "Legendary 1000");
    assert_eq!(second.display_score(), 1020);
}
