use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregate::{partition_valid, RecordDiagnostic};
use super::period::PeriodRange;
use crate::goal::Goals;
use crate::record::SessionRecord;

/// Progress of one goal in its current period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub range: PeriodRange,
    pub recorded_minutes: f64,
    pub target_minutes: u32,
    /// `recorded / target`; 0.0 upward, not capped at 1.0.
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressReport {
    /// Only tags that have a goal.
    pub goals: BTreeMap<String, GoalProgress>,
    pub diagnostics: Vec<RecordDiagnostic>,
}

impl GoalProgressReport {
    /// Tag -> fraction view.
    pub fn fractions(&self) -> BTreeMap<String, f64> {
        self.goals
            .iter()
            .map(|(tag, p)| (tag.clone(), p.fraction))
            .collect()
    }
}

/// Evaluate every goal against the window of its own period that contains
/// `reference_date`.
pub fn goal_progress(records: &[SessionRecord], goals: &Goals, reference_date: NaiveDate) -> GoalProgressReport {
    let (valid, diagnostics) = partition_valid(records);

    let progress = goals
        .iter()
        .map(|(tag, goal)| {
            let range = PeriodRange::containing(goal.period(), reference_date);
            let seconds: i64 = valid
                .iter()
                .filter(|r| r.tag == *tag && range.contains(r.local_date()))
                .map(|r| r.duration_seconds)
                .sum();
            let recorded_minutes = seconds as f64 / 60.0;
            let target = goal.target_minutes_per_period();
            (
                tag.clone(),
                GoalProgress {
                    range,
                    recorded_minutes,
                    target_minutes: target,
                    fraction: recorded_minutes / f64::from(target),
                },
            )
        })
        .collect();

    GoalProgressReport {
        goals: progress,
        diagnostics,
    }
}
