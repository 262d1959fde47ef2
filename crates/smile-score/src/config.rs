//! Configuration types for the smile score engine.
//!
//! Configuration is read from a JSON file with camelCase keys. Every field
//! has a default, so a missing file or an empty object yields a working setup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::milestone::{default_tiers, MilestoneTier, MAX_MILESTONES};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "smile-score.json";

/// Default path of the durable score file.
fn default_score_file() -> String {
    "smile_score.txt".to_string()
}

/// Default points earned per second of contiguous smiling.
const fn default_points_per_second() -> f64 {
    25.0
}

/// Default minimum number of seconds between periodic saves.
const fn default_save_interval_secs() -> f64 {
    3.0
}

/// Main configuration for the smile score tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the file holding the persisted score.
    #[serde(default = "default_score_file")]
    pub score_file: String,

    /// Points added per second of contiguous smiling.
    #[serde(default = "default_points_per_second")]
    pub points_per_second: f64,

    /// Minimum seconds between periodic saves.
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: f64,

    /// Whether milestones below a reloaded score are announced again.
    #[serde(default)]
    pub milestone_replay: MilestoneReplay,

    /// Milestone tiers, in ascending order.
    #[serde(default = "default_tiers")]
    pub milestones: Vec<MilestoneTier>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            score_file: default_score_file(),
            points_per_second: default_points_per_second(),
            save_interval_secs: default_save_interval_secs(),
            milestone_replay: MilestoneReplay::default(),
            milestones: default_tiers(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `smile-score.json` in the current directory. If not found,
    /// returns the default configuration.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ScoreError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `smile-score.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ConfigParseError` if the file exists but contains
    /// invalid JSON or invalid enum values.
    ///
    /// Returns `ScoreError::ConfigValidationError` if the configuration values
    /// are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ScoreError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ScoreError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `scoreFile` must not be empty
    /// - `pointsPerSecond` must be finite and greater than 0
    /// - `saveIntervalSecs` must be finite and not negative
    /// - every milestone tier needs `step > 0`, `from <= to` and a message
    /// - tiers must be strictly ascending and must not overlap
    /// - all tiers together may yield at most [`MAX_MILESTONES`] milestones
    pub fn validate(&self) -> Result<()> {
        if self.score_file.trim().is_empty() {
            return Err(ScoreError::config_validation(
                "scoreFile must not be empty",
                "Provide a file path for the saved score in your smile-score.json",
            ));
        }

        if !self.points_per_second.is_finite() || self.points_per_second <= 0.0 {
            return Err(ScoreError::config_validation(
                "pointsPerSecond must be a finite number greater than 0",
                "Set pointsPerSecond to a positive number such as 25 in your smile-score.json",
            ));
        }

        if !self.save_interval_secs.is_finite() || self.save_interval_secs < 0.0 {
            return Err(ScoreError::config_validation(
                "saveIntervalSecs must be a finite number of at least 0",
                "Set saveIntervalSecs to 0 (save every tick) or more in your smile-score.json",
            ));
        }

        let mut previous_end: Option<u64> = None;
        for (index, tier) in self.milestones.iter().enumerate() {
            if tier.step == 0 {
                return Err(ScoreError::config_validation(
                    format!("milestones[{index}].step must be greater than 0"),
                    "Give every milestone tier a positive step",
                ));
            }
            if tier.from > tier.to {
                return Err(ScoreError::config_validation(
                    format!(
                        "milestones[{index}] starts at {} but ends at {}",
                        tier.from, tier.to
                    ),
                    "Make sure each tier's 'from' is not greater than its 'to'",
                ));
            }
            if tier.message.trim().is_empty() {
                return Err(ScoreError::config_validation(
                    format!("milestones[{index}].message must not be empty"),
                    "Give every milestone tier a message, e.g. \"Reached {points} points!\"",
                ));
            }
            if previous_end.is_some_and(|end| tier.from <= end) {
                return Err(ScoreError::config_validation(
                    format!("milestones[{index}] overlaps the tier before it"),
                    "List milestone tiers in ascending order without overlapping ranges",
                ));
            }
            previous_end = Some(tier.to);
        }

        let total = self
            .milestones
            .iter()
            .fold(0u64, |sum, tier| sum.saturating_add(tier.count()));
        if total > MAX_MILESTONES as u64 {
            return Err(ScoreError::config_validation(
                format!("milestones define {total} values, more than the limit of {MAX_MILESTONES}"),
                "Use a larger step or a narrower range in your milestone tiers",
            ));
        }

        Ok(())
    }

    /// Minimum time between periodic saves.
    pub fn save_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.save_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs(3))
    }
}

/// What happens to milestones below the score loaded at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MilestoneReplay {
    /// Milestones already passed are marked achieved silently (default).
    #[default]
    Never,
    /// Milestones already passed are announced once on the first tick.
    OnFirstTick,
}

impl MilestoneReplay {
    /// Parses a string into a `MilestoneReplay`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "never" => Some(Self::Never),
            "on_first_tick" => Some(Self::OnFirstTick),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for MilestoneReplay {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid milestone replay '{s}': expected one of 'never', 'on_first_tick'"
            ))
        })
    }
}

impl Serialize for MilestoneReplay {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Never => "never",
            Self::OnFirstTick => "on_first_tick",
        };
        serializer.serialize_str(s)
    }
}
