//! Smile Score Engine
//!
//! Turns a per-frame "is smiling" signal into a persistent, monotonically
//! growing score with one-time milestone rewards.

pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod milestone;
pub mod store;

pub use config::{Config, MilestoneReplay};
pub use detector::{SignalDetector, SignalLine, SmileDetector};
pub use engine::{
    display_score, parse_score, ScoreEngine, ScoreState, TickResult, DEFAULT_POINTS_PER_SECOND,
};
pub use error::{Result, ScoreError};
pub use milestone::{default_tiers, Milestone, MilestoneSchedule, MilestoneTier, MAX_MILESTONES};
pub use store::{format_score, FileStore, MemoryStore, ScoreStore};
