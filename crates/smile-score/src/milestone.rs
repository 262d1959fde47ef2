//! Milestone tiers and the precomputed milestone schedule.
//!
//! A schedule is built once from a list of [`MilestoneTier`]s and never
//! changes afterwards. The engine walks it with a cursor, so the cost of a
//! tick does not grow with the size of the table.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the milestone value in a tier's message template.
pub const POINTS_PLACEHOLDER: &str = "{points}";

/// Upper limit on the number of milestones in one schedule.
pub const MAX_MILESTONES: usize = 100_000;

/// One arithmetic run of milestones sharing a message template.
///
/// Yields `from`, `from + step`, `from + 2*step`, ... up to and including `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTier {
    /// First milestone value in the tier.
    pub from: u64,
    /// Upper bound (inclusive) for milestone values in the tier.
    pub to: u64,
    /// Distance between consecutive milestones.
    pub step: u64,
    /// Message template; `{points}` is replaced by the milestone value.
    pub message: String,
}

impl MilestoneTier {
    /// Creates a new tier.
    pub fn new(from: u64, to: u64, step: u64, message: impl Into<String>) -> Self {
        Self {
            from,
            to,
            step,
            message: message.into(),
        }
    }

    /// Renders the message template for `value`.
    #[must_use]
    pub fn render(&self, value: u64) -> String {
        self.message.replace(POINTS_PLACEHOLDER, &value.to_string())
    }

    /// Number of milestone values the tier yields; 0 for a zero step or an empty range.
    pub const fn count(&self) -> u64 {
        if self.step == 0 || self.from > self.to {
            0
        } else {
            ((self.to - self.from) / self.step).saturating_add(1)
        }
    }

    fn values(&self) -> impl Iterator<Item = u64> + '_ {
        let step = usize::try_from(self.step).unwrap_or(usize::MAX);
        (self.from..=self.to).step_by(step.max(1))
    }
}

/// The default tiers: every 100 points up to 1000, then every 500 points up to one million.
pub fn default_tiers() -> Vec<MilestoneTier> {
    vec![
        MilestoneTier::new(100, 1000, 100, "🎉 Great job! You've reached {points} points!"),
        MilestoneTier::new(1500, 1_000_000, 500, "🔥 Awesome! You've hit {points} points!"),
    ]
}

/// A score threshold with the message announced when it is first reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    /// Score value that triggers the milestone.
    pub value: u64,
    /// Rendered reward message.
    pub message: String,
}

impl Milestone {
    /// Returns `true` if `score` is at or above this milestone.
    #[allow(clippy::cast_precision_loss)]
    pub fn is_reached_by(&self, score: f64) -> bool {
        score >= self.value as f64
    }
}

/// Fixed, ascending sequence of milestones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneSchedule {
    milestones: Vec<Milestone>,
}

impl MilestoneSchedule {
    /// Builds the schedule from a list of tiers.
    ///
    /// Tiers with a zero step are skipped. Values are sorted and a value
    /// produced by more than one tier keeps the first tier's message.
    /// At most [`MAX_MILESTONES`] values are taken, in tier order.
    pub fn from_tiers(tiers: &[MilestoneTier]) -> Self {
        let mut milestones: Vec<Milestone> = tiers
            .iter()
            .filter(|tier| tier.step > 0)
            .flat_map(|tier| {
                tier.values().map(move |value| Milestone {
                    value,
                    message: tier.render(value),
                })
            })
            .take(MAX_MILESTONES)
            .collect();
        milestones.sort_by_key(|m| m.value);
        milestones.dedup_by_key(|m| m.value);
        Self { milestones }
    }

    /// Number of milestones in the schedule.
    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    /// Returns `true` if the schedule has no milestones.
    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// Milestone at `index` in ascending order.
    pub fn get(&self, index: usize) -> Option<&Milestone> {
        self.milestones.get(index)
    }

    /// All milestones in ascending order.
    pub fn as_slice(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Number of leading milestones already reached by `score`.
    pub fn count_reached(&self, score: f64) -> usize {
        self.milestones.partition_point(|m| m.is_reached_by(score))
    }
}

impl Default for MilestoneSchedule {
    fn default() -> Self {
        Self::from_tiers(&default_tiers())
    }
}
