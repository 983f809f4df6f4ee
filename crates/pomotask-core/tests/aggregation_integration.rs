//! Aggregation and goal progress over records read back from a session log.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};
use pomotask_core::goal::upsert;
use pomotask_core::stats::{aggregate, goal_progress, period_totals, AggregationInputError};
use pomotask_core::storage::{GoalFile, GoalStore, SessionLog, SessionStore};
use pomotask_core::{EndReason, Goal, Goals, Period, PeriodRange, SessionMode, SessionRecord};
use proptest::prelude::*;

fn noon(date: NaiveDate) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
        .unwrap()
}

fn record(date: NaiveDate, seconds: i64, tag: &str) -> SessionRecord {
    let start = noon(date);
    SessionRecord {
        start_timestamp: start,
        end_timestamp: start + Duration::seconds(seconds.max(0)),
        duration_seconds: seconds,
        tag: tag.into(),
        note: String::new(),
        mode: SessionMode::Work,
        ended_by: EndReason::Completed,
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn weekly_view_from_a_real_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = SessionLog::at(dir.path().join("sessions.jsonl"));
    // Week of 2024-01-01 (Mon) .. 2024-01-07 (Sun), then the next week.
    log.append(&record(d(2024, 1, 1), 1500, "Reading")).unwrap();
    log.append(&record(d(2024, 1, 7), 1500, "Reading")).unwrap();
    log.append(&record(d(2024, 1, 3), 600, "Work")).unwrap();
    log.append(&record(d(2024, 1, 8), 300, "Reading")).unwrap();

    let records = log.read_all().unwrap();
    let view = aggregate(&records, Period::Week, d(2024, 1, 8));

    assert_eq!(view.current.start, d(2024, 1, 8));
    let first_week: Vec<_> = view
        .buckets
        .iter()
        .filter(|b| b.period_start == d(2024, 1, 1))
        .map(|b| (b.tag.clone().unwrap(), b.total_minutes))
        .collect();
    assert_eq!(
        first_week,
        vec![("Reading".to_string(), 50.0), ("Work".to_string(), 10.0)]
    );
    assert_eq!(view.current_total_minutes(), 5.0);
    assert!(view.diagnostics.is_empty());
}

#[test]
fn goals_file_drives_progress() {
    let dir = tempfile::tempdir().unwrap();
    let mut goals_file = GoalFile::at(dir.path().join("goals.toml"));
    let mut goals = Goals::new();
    upsert(&mut goals, Goal::new("Math", 300, Period::Week).unwrap());
    goals_file.save(&goals).unwrap();

    let records = vec![
        record(d(2024, 1, 2), 90 * 60, "Math"),
        record(d(2024, 1, 4), 60 * 60, "Math"),
        record(d(2023, 12, 31), 600 * 60, "Math"),
    ];
    let report = goal_progress(&records, &goals_file.load().unwrap(), d(2024, 1, 5));
    assert_eq!(report.fractions()["Math"], 0.5);
}

#[test]
fn month_totals_ignore_other_months() {
    let records = vec![
        record(d(2024, 2, 1), 600, "Health"),
        record(d(2024, 2, 29), 600, "Health"),
        record(d(2024, 3, 1), 600, "Health"),
    ];
    let totals = period_totals(&records, Period::Month, d(2024, 2, 14));
    assert_eq!(totals.range.end, d(2024, 2, 29));
    assert_eq!(totals.totals["Health"], 20.0);
}

#[test]
fn malformed_records_are_reported_not_counted() {
    let mut bad = record(d(2024, 1, 2), 600, "Work");
    bad.end_timestamp = bad.start_timestamp - Duration::minutes(1);
    let records = vec![record(d(2024, 1, 2), 600, "Work"), bad, record(d(2024, 1, 2), -5, "Work")];

    let view = aggregate(&records, Period::Week, d(2024, 1, 2));
    assert_eq!(view.current_total_minutes(), 10.0);
    assert_eq!(view.diagnostics.len(), 2);
    assert_eq!(view.diagnostics[0].index, 1);
    assert_eq!(view.diagnostics[0].error, AggregationInputError::EndBeforeStart);
    assert!(matches!(
        view.diagnostics[1].error,
        AggregationInputError::NegativeDuration { .. }
    ));
}

fn arb_record() -> impl Strategy<Value = SessionRecord> {
    (0i64..730, 0i64..7200, prop::sample::select(vec!["Reading", "Work", "Health", ""]))
        .prop_map(|(offset, seconds, tag)| record(d(2023, 1, 1) + Duration::days(offset), seconds, tag))
}

proptest! {
    #[test]
    fn aggregation_is_deterministic(records in prop::collection::vec(arb_record(), 0..40), offset in 0i64..730) {
        let reference = d(2023, 1, 1) + Duration::days(offset);
        for period in [Period::Week, Period::Month] {
            prop_assert_eq!(aggregate(&records, period, reference), aggregate(&records, period, reference));
        }
    }

    #[test]
    fn every_bucket_is_a_real_window_and_totals_match(
        records in prop::collection::vec(arb_record(), 0..40),
        offset in 0i64..730,
    ) {
        let reference = d(2023, 1, 1) + Duration::days(offset);
        for period in [Period::Week, Period::Month] {
            let view = aggregate(&records, period, reference);
            for bucket in &view.buckets {
                let window = PeriodRange::containing(period, bucket.period_start);
                prop_assert_eq!(window.start, bucket.period_start);
                prop_assert_eq!(window.end, bucket.period_end);
            }
            prop_assert!(view.buckets.iter().any(|b| b.period_start == view.current.start));

            let expected: i64 = records.iter().map(|r| r.duration_seconds).sum();
            let total: f64 = view.buckets.iter().map(|b| b.total_minutes).sum();
            prop_assert!((total - expected as f64 / 60.0).abs() < 1e-6);
        }
    }

    #[test]
    fn a_negative_record_never_changes_the_totals(
        records in prop::collection::vec(arb_record(), 0..20),
        bad_seconds in -7200i64..-1,
        offset in 0i64..730,
    ) {
        let reference = d(2023, 1, 1) + Duration::days(offset);
        let mut with_bad = records.clone();
        with_bad.push(record(reference, bad_seconds, "Work"));

        let clean = aggregate(&records, Period::Week, reference);
        let dirty = aggregate(&with_bad, Period::Week, reference);
        prop_assert_eq!(&clean.buckets, &dirty.buckets);
        prop_assert_eq!(dirty.diagnostics.len(), 1);
    }
}
