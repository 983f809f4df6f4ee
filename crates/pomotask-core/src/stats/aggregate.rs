//! Bucketing of session records into per-(period, tag) totals.
//!
//! Everything here is a pure function of its inputs: the dashboard refreshes
//! by recomputing, never by patching earlier results.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::period::{Period, PeriodRange};
use crate::record::SessionRecord;

/// Why a record was left out of the totals.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationInputError {
    #[error("negative duration ({duration_seconds}s)")]
    NegativeDuration { duration_seconds: i64 },

    #[error("end timestamp is before start timestamp")]
    EndBeforeStart,

    #[error("duration {duration_seconds}s exceeds the {span_seconds}s between start and end")]
    DurationExceedsSpan {
        duration_seconds: i64,
        span_seconds: i64,
    },
}

/// A record that was excluded, with its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDiagnostic {
    pub index: usize,
    pub start_timestamp: DateTime<Local>,
    pub tag: String,
    pub error: AggregationInputError,
}

/// Total minutes for one tag within one period window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// `None` only for the placeholder row of an otherwise empty current period.
    pub tag: Option<String>,
    pub total_minutes: f64,
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub period: Period,
    /// The window containing the reference date.
    pub current: PeriodRange,
    /// Ordered by `period_start`, then tag.
    pub buckets: Vec<AggregateBucket>,
    pub diagnostics: Vec<RecordDiagnostic>,
}

impl Aggregation {
    /// Buckets of the reference period.
    pub fn current_buckets(&self) -> impl Iterator<Item = &AggregateBucket> {
        let start = self.current.start;
        self.buckets.iter().filter(move |b| b.period_start == start)
    }

    pub fn current_total_minutes(&self) -> f64 {
        self.current_buckets().map(|b| b.total_minutes).sum()
    }
}

/// Per-tag minutes for the single period containing the reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub range: PeriodRange,
    pub totals: BTreeMap<String, f64>,
    pub diagnostics: Vec<RecordDiagnostic>,
}

/// Check a record before it is counted.
pub fn validate_record(record: &SessionRecord) -> Result<(), AggregationInputError> {
    if record.duration_seconds < 0 {
        return Err(AggregationInputError::NegativeDuration {
            duration_seconds: record.duration_seconds,
        });
    }
    let span_seconds = record.span_seconds();
    if span_seconds < 0 {
        return Err(AggregationInputError::EndBeforeStart);
    }
    if record.duration_seconds > span_seconds {
        return Err(AggregationInputError::DurationExceedsSpan {
            duration_seconds: record.duration_seconds,
            span_seconds,
        });
    }
    Ok(())
}

/// Split records into the ones that may be counted and diagnostics for the rest.
pub(crate) fn partition_valid(records: &[SessionRecord]) -> (Vec<&SessionRecord>, Vec<RecordDiagnostic>) {
    let mut valid = Vec::with_capacity(records.len());
    let mut diagnostics = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match validate_record(record) {
            Ok(()) => valid.push(record),
            Err(error) => diagnostics.push(RecordDiagnostic {
                index,
                start_timestamp: record.start_timestamp,
                tag: record.tag.clone(),
                error,
            }),
        }
    }
    if !diagnostics.is_empty() {
        warn!(excluded = diagnostics.len(), "malformed session records excluded from statistics");
    }
    (valid, diagnostics)
}

/// Group records into `(period window, tag)` buckets.
///
/// A record counts toward the window containing its start date, even when it
/// runs past the window's end. Windows without records are omitted except the
/// one containing `reference_date`, which always appears.
pub fn aggregate(records: &[SessionRecord], period: Period, reference_date: NaiveDate) -> Aggregation {
    let (valid, diagnostics) = partition_valid(records);

    let mut seconds: BTreeMap<(PeriodRange, &str), i64> = BTreeMap::new();
    for record in valid {
        let range = PeriodRange::containing(period, record.local_date());
        *seconds.entry((range, record.tag.as_str())).or_default() += record.duration_seconds;
    }

    let mut buckets: Vec<AggregateBucket> = seconds
        .into_iter()
        .map(|((range, tag), secs)| AggregateBucket {
            period_start: range.start,
            period_end: range.end,
            tag: Some(tag.to_string()),
            total_minutes: secs as f64 / 60.0,
        })
        .collect();

    let current = PeriodRange::containing(period, reference_date);
    if !buckets.iter().any(|b| b.period_start == current.start) {
        let at = buckets.partition_point(|b| b.period_start < current.start);
        buckets.insert(
            at,
            AggregateBucket {
                period_start: current.start,
                period_end: current.end,
                tag: None,
                total_minutes: 0.0,
            },
        );
    }

    Aggregation {
        period,
        current,
        buckets,
        diagnostics,
    }
}

/// Tag -> minutes for the window containing `reference_date` only.
pub fn period_totals(records: &[SessionRecord], period: Period, reference_date: NaiveDate) -> PeriodTotals {
    let range = PeriodRange::containing(period, reference_date);
    let (valid, diagnostics) = partition_valid(records);
    let mut seconds: BTreeMap<String, i64> = BTreeMap::new();
    for record in valid.into_iter().filter(|r| range.contains(r.local_date())) {
        *seconds.entry(record.tag.clone()).or_default() += record.duration_seconds;
    }
    PeriodTotals {
        range,
        totals: seconds
            .into_iter()
            .map(|(tag, secs)| (tag, secs as f64 / 60.0))
            .collect(),
        diagnostics,
    }
}

/// Round minutes to one decimal place for display.
pub fn round_minutes(minutes: f64) -> f64 {
    (minutes * 10.0).round() / 10.0
}
