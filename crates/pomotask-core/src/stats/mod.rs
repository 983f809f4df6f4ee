//! Statistics module for Pomotask
//!
//! Turns the raw session log into the dashboard's views: per-week and
//! per-month totals grouped by tag, and goal progress fractions. Every
//! function here is pure, so views are refreshed by recomputation.

mod aggregate;
mod period;
mod progress;

pub use aggregate::{
    aggregate, period_totals, round_minutes, validate_record, AggregateBucket, Aggregation,
    AggregationInputError, PeriodTotals, RecordDiagnostic,
};

pub use period::{Period, PeriodRange};

pub use progress::{goal_progress, GoalProgress, GoalProgressReport};
