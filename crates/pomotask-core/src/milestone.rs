//! Calendar milestones: countdowns to a future date and anniversaries of a past one.
//!
//! Day counts are plain calendar-date arithmetic on naive local dates.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneKind {
    /// Counting down to a date.
    Countdown,
    /// Counting days since a date.
    Anniversary,
}

impl FromStr for MilestoneKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "countdown" => Ok(MilestoneKind::Countdown),
            "anniversary" | "since" => Ok(MilestoneKind::Anniversary),
            other => Err(ValidationError::invalid(
                "kind",
                format!("expected 'countdown' or 'anniversary', got '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub target_date: NaiveDate,
    pub kind: MilestoneKind,
}

impl Milestone {
    /// # Errors
    /// `ValidationError::Empty` when the name is blank.
    pub fn new(
        name: impl Into<String>,
        target_date: NaiveDate,
        kind: MilestoneKind,
    ) -> Result<Self, ValidationError> {
        let milestone = Self {
            name: name.into().trim().to_string(),
            target_date,
            kind,
        };
        milestone.validate()?;
        Ok(milestone)
    }

    /// Pick the kind from where the date falls relative to `today`.
    pub fn infer_kind(target_date: NaiveDate, today: NaiveDate) -> MilestoneKind {
        if target_date > today {
            MilestoneKind::Countdown
        } else {
            MilestoneKind::Anniversary
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name".into()));
        }
        Ok(())
    }
}

/// Signed days from `reference_date` to the milestone: positive while the
/// target is ahead, 0 on the day itself, negative once it has passed.
pub fn days_delta(milestone: &Milestone, reference_date: NaiveDate) -> i64 {
    (milestone.target_date - reference_date).num_days()
}

/// Display-ready reading of [`days_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "days", rename_all = "snake_case")]
pub enum MilestoneStatus {
    DaysLeft(u64),
    Today,
    DaysSince(u64),
}

impl MilestoneStatus {
    pub fn of(milestone: &Milestone, reference_date: NaiveDate) -> Self {
        let delta = days_delta(milestone, reference_date);
        match delta {
            0 => MilestoneStatus::Today,
            d if d > 0 => MilestoneStatus::DaysLeft(d.unsigned_abs()),
            d => MilestoneStatus::DaysSince(d.unsigned_abs()),
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneStatus::DaysLeft(n) => write!(f, "{n} days left"),
            MilestoneStatus::Today => f.write_str("today"),
            MilestoneStatus::DaysSince(n) => write!(f, "{n} days since"),
        }
    }
}

/// Countdowns first, soonest date first; then anniversaries, most recent first.
pub fn sort_for_display(milestones: &mut [Milestone]) {
    milestones.sort_by_key(|m| match m.kind {
        MilestoneKind::Countdown => (0, m.target_date, Reverse(NaiveDate::MIN)),
        MilestoneKind::Anniversary => (1, NaiveDate::MIN, Reverse(m.target_date)),
    });
}
