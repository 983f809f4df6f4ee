//! Per-tag time goals.
//!
//! A [`Goal`] can only be built through [`Goal::new`] (or deserialized through
//! the same checks), so every goal that reaches aggregation has a positive
//! target.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::record::normalize_tag;
use crate::stats::Period;

/// Goals keyed by tag.
pub type Goals = BTreeMap<String, Goal>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GoalFields")]
pub struct Goal {
    tag: String,
    target_minutes_per_period: u32,
    period: Period,
}

/// Unchecked shape of a goal as it appears on disk. Convert with `Goal::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct GoalFields {
    pub tag: String,
    pub target_minutes_per_period: u32,
    pub period: Period,
}

impl Goal {
    /// # Errors
    /// `ValidationError` when the target is zero.
    pub fn new(
        tag: impl AsRef<str>,
        target_minutes_per_period: u32,
        period: Period,
    ) -> Result<Self, ValidationError> {
        if target_minutes_per_period == 0 {
            return Err(ValidationError::invalid(
                "target_minutes_per_period",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            tag: normalize_tag(tag.as_ref()),
            target_minutes_per_period,
            period,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn target_minutes_per_period(&self) -> u32 {
        self.target_minutes_per_period
    }

    pub fn period(&self) -> Period {
        self.period
    }
}

impl TryFrom<GoalFields> for Goal {
    type Error = ValidationError;

    fn try_from(fields: GoalFields) -> Result<Self, Self::Error> {
        Goal::new(fields.tag, fields.target_minutes_per_period, fields.period)
    }
}

/// Insert or replace the goal for its tag.
pub fn upsert(goals: &mut Goals, goal: Goal) -> Option<Goal> {
    goals.insert(goal.tag.clone(), goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_is_rejected() {
        assert!(Goal::new("Math", 0, Period::Week).is_err());
    }

    #[test]
    fn tag_is_normalized() {
        let goal = Goal::new("  Math ", 300, Period::Week).unwrap();
        assert_eq!(goal.tag(), "Math");
    }

    #[test]
    fn deserializing_a_zero_target_fails() {
        let json = r#"{"tag":"Math","target_minutes_per_period":0,"period":"week"}"#;
        assert!(serde_json::from_str::<Goal>(json).is_err());
    }

    #[test]
    fn upsert_replaces_by_tag() {
        let mut goals = Goals::new();
        upsert(&mut goals, Goal::new("Math", 300, Period::Week).unwrap());
        let old = upsert(&mut goals, Goal::new("Math", 600, Period::Month).unwrap());
        assert_eq!(old.map(|g| g.target_minutes_per_period()), Some(300));
        assert_eq!(goals.len(), 1);
        assert_eq!(goals["Math"].period(), Period::Month);
    }
}
