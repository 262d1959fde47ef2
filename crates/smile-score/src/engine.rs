//! The smile score state machine.
//!
//! [`ScoreEngine`] turns one boolean "is smiling" verdict per tick into a
//! cumulative score. Credit is only given for time between two consecutive
//! smiling ticks, so a single not-smiling tick forfeits the open interval.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use smile_score::{MemoryStore, ScoreEngine};
//!
//! let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
//! let mut engine = ScoreEngine::new(MemoryStore::with_contents("95"), start);
//!
//! engine.tick(true, start);
//! let result = engine.tick(true, start + Duration::seconds(1));
//! assert_eq!(result.display_score(), 120);
//! assert_eq!(result.newly_achieved[0].value, 100);
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, MilestoneReplay};
use crate::error::{Result, ScoreError};
use crate::milestone::{Milestone, MilestoneSchedule};
use crate::store::ScoreStore;

/// Default points earned per second of contiguous smiling.
pub const DEFAULT_POINTS_PER_SECOND: f64 = 25.0;

// ============================================================================
// ScoreState
// ============================================================================

/// Mutable state owned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreState {
    /// Cumulative score; never decreases.
    pub score: f64,

    /// Start of the current contiguous smiling interval, if smiling.
    pub smiling_since: Option<DateTime<Utc>>,

    /// Values of milestones already rewarded.
    pub achieved_milestones: BTreeSet<u64>,

    /// Time of the last successful durable write.
    pub last_persisted_at: DateTime<Utc>,
}

impl ScoreState {
    /// Creates a state holding `score` with no open interval.
    pub const fn new(score: f64, now: DateTime<Utc>) -> Self {
        Self {
            score,
            smiling_since: None,
            achieved_milestones: BTreeSet::new(),
            last_persisted_at: now,
        }
    }

    /// Returns `true` while a smiling interval is open.
    pub const fn is_smiling(&self) -> bool {
        self.smiling_since.is_some()
    }
}

// ============================================================================
// TickResult
// ============================================================================

/// Outcome of a single tick, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    /// Score after the tick, unrounded.
    pub score: f64,

    /// Milestones first reached on this tick, in ascending order.
    pub newly_achieved: Vec<Milestone>,
}

impl TickResult {
    /// Score rounded down for display.
    pub fn display_score(&self) -> u64 {
        display_score(self.score)
    }
}

/// Rounds a score down to the integer shown to the user.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn display_score(score: f64) -> u64 {
    // `as` saturates, so NaN and negatives map to 0
    score.floor() as u64
}

/// Parses stored score text.
///
/// Returns `None` for anything that is not a finite, non-negative number.
pub fn parse_score(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite() && *score >= 0.0)
        // Turns -0.0 into 0.0
        .map(|score| score + 0.0)
}

/// Rejects rates that could make the score shrink or turn NaN.
fn validate_rate(points_per_second: f64) -> Result<()> {
    if points_per_second.is_finite() && points_per_second > 0.0 {
        return Ok(());
    }
    Err(ScoreError::config_validation(
        format!("points per second must be a finite number greater than 0, got {points_per_second}"),
        "Pass a positive rate such as 25",
    ))
}

/// Seconds from `since` to `now`, or zero if `now` is earlier.
fn elapsed_secs(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).to_std().map_or(0.0, |d| d.as_secs_f64())
}

// ============================================================================
// ScoreEngine
// ============================================================================

/// Converts a stream of smiling verdicts into a persisted score.
#[derive(Debug)]
pub struct ScoreEngine<S: ScoreStore> {
    state: ScoreState,
    schedule: MilestoneSchedule,
    /// Index of the lowest milestone not yet achieved.
    cursor: usize,
    points_per_second: f64,
    store: S,
    last_persist_attempt: DateTime<Utc>,
}

impl<S: ScoreStore> ScoreEngine<S> {
    /// Creates an engine with the default rate, milestones and restart policy.
    pub fn new(store: S, now: DateTime<Utc>) -> Self {
        Self::build(
            store,
            MilestoneSchedule::default(),
            DEFAULT_POINTS_PER_SECOND,
            MilestoneReplay::default(),
            now,
        )
    }

    /// Creates an engine from a configuration, validating it first.
    ///
    /// `config.score_file` is not consulted; the caller chooses the store.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ConfigValidationError` if `config` fails
    /// [`Config::validate`].
    pub fn from_config(store: S, config: &Config, now: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            store,
            MilestoneSchedule::from_tiers(&config.milestones),
            config.points_per_second,
            config.milestone_replay,
            now,
        ))
    }

    /// Creates an engine, loading the initial score from `store`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ConfigValidationError` unless `points_per_second`
    /// is finite and greater than 0.
    pub fn with_schedule(
        store: S,
        schedule: MilestoneSchedule,
        points_per_second: f64,
        replay: MilestoneReplay,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_rate(points_per_second)?;
        Ok(Self::build(store, schedule, points_per_second, replay, now))
    }

    fn build(
        store: S,
        schedule: MilestoneSchedule,
        points_per_second: f64,
        replay: MilestoneReplay,
        now: DateTime<Utc>,
    ) -> Self {
        let score = Self::load(&store);
        let mut state = ScoreState::new(score, now);

        let cursor = match replay {
            MilestoneReplay::Never => {
                let passed = schedule.count_reached(score);
                state
                    .achieved_milestones
                    .extend(schedule.as_slice()[..passed].iter().map(|m| m.value));
                passed
            }
            MilestoneReplay::OnFirstTick => 0,
        };

        info!(
            score,
            store = %store.location(),
            milestones = schedule.len(),
            already_achieved = state.achieved_milestones.len(),
            "Smile score loaded"
        );

        Self {
            state,
            schedule,
            cursor,
            points_per_second,
            store,
            last_persist_attempt: now,
        }
    }

    /// Reads the initial score from `store`.
    ///
    /// Never fails: a missing, unreadable or malformed record yields zero.
    pub fn load(store: &S) -> f64 {
        match store.load() {
            Ok(Some(text)) => parse_score(&text).unwrap_or_else(|| {
                warn!(
                    store = %store.location(),
                    contents = %text.trim(),
                    "Saved score is not a non-negative number, starting from zero"
                );
                0.0
            }),
            Ok(None) => {
                debug!(store = %store.location(), "No saved score, starting from zero");
                0.0
            }
            Err(e) => {
                warn!(
                    store = %store.location(),
                    error = %e,
                    "Could not read saved score, starting from zero"
                );
                0.0
            }
        }
    }

    /// Advances the state machine by one detection tick.
    ///
    /// `now` should not go backwards between calls. If it does, the tick
    /// earns nothing and the open interval keeps its later start.
    pub fn tick(&mut self, smiling: bool, now: DateTime<Utc>) -> TickResult {
        if smiling {
            match self.state.smiling_since {
                None => self.state.smiling_since = Some(now),
                Some(since) => {
                    let elapsed = elapsed_secs(since, now);
                    self.state.score += elapsed * self.points_per_second;
                    self.state.smiling_since = Some(since.max(now));
                }
            }
        } else {
            self.state.smiling_since = None;
        }

        let newly_achieved = self.collect_milestones();
        TickResult {
            score: self.state.score,
            newly_achieved,
        }
    }

    /// Marks every milestone the score has reached since the last tick.
    fn collect_milestones(&mut self) -> Vec<Milestone> {
        let mut newly_achieved = Vec::new();
        while let Some(milestone) = self.schedule.get(self.cursor) {
            if !milestone.is_reached_by(self.state.score) {
                break;
            }
            if self.state.achieved_milestones.insert(milestone.value) {
                info!(milestone = milestone.value, score = self.state.score, "Milestone reached");
                newly_achieved.push(milestone.clone());
            }
            self.cursor += 1;
        }
        newly_achieved
    }

    /// Saves the score if at least `min_interval` has passed since the last attempt.
    ///
    /// Returns whether a write happened. A failed write still counts as an
    /// attempt, so retries are spaced by `min_interval` as well.
    pub fn persist_if_due(&mut self, now: DateTime<Utc>, min_interval: Duration) -> Result<bool> {
        if elapsed_secs(self.last_persist_attempt, now) < min_interval.as_secs_f64() {
            return Ok(false);
        }
        self.last_persist_attempt = now;
        self.write(now)?;
        Ok(true)
    }

    /// Saves the score unconditionally.
    ///
    /// Also restarts the periodic interval, so a `persist_if_due` right
    /// after this call does not write again.
    pub fn persist_now(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.last_persist_attempt = now;
        self.write(now)
    }

    fn write(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.store.save(self.state.score)?;
        self.state.last_persisted_at = at;
        debug!(score = self.state.score, store = %self.store.location(), "Score saved");
        Ok(())
    }

    /// Current unrounded score.
    pub const fn score(&self) -> f64 {
        self.state.score
    }

    /// Current engine state.
    pub const fn state(&self) -> &ScoreState {
        &self.state
    }

    /// The milestone schedule in use.
    pub const fn schedule(&self) -> &MilestoneSchedule {
        &self.schedule
    }

    /// The lowest milestone not yet achieved.
    pub fn next_milestone(&self) -> Option<&Milestone> {
        self.schedule.get(self.cursor)
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
