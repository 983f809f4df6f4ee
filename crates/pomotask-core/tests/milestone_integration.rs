use chrono::{Duration, NaiveDate};
use pomotask_core::milestone::sort_for_display;
use pomotask_core::storage::{MilestoneFile, MilestoneStore};
use pomotask_core::{days_delta, Milestone, MilestoneKind, MilestoneStatus};
use proptest::prelude::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

#[test]
fn saved_milestones_render_in_display_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = MilestoneFile::at(dir.path().join("milestones.toml"));
    file.save(&[
        Milestone::new("Started running", today() - Duration::days(100), MilestoneKind::Anniversary).unwrap(),
        Milestone::new("Marathon", today() + Duration::days(120), MilestoneKind::Countdown).unwrap(),
        Milestone::new("Exam", today(), MilestoneKind::Countdown).unwrap(),
    ])
    .unwrap();

    let mut loaded = file.load().unwrap();
    sort_for_display(&mut loaded);
    let lines: Vec<String> = loaded
        .iter()
        .map(|m| format!("{}: {}", m.name, MilestoneStatus::of(m, today())))
        .collect();
    assert_eq!(
        lines,
        vec![
            "Exam: today",
            "Marathon: 120 days left",
            "Started running: 100 days since",
        ]
    );
}

proptest! {
    #[test]
    fn delta_is_antisymmetric_in_the_dates(a in -20_000i64..20_000, b in -20_000i64..20_000) {
        let first = today() + Duration::days(a);
        let second = today() + Duration::days(b);
        let m_first = Milestone::new("x", first, MilestoneKind::Countdown).unwrap();
        let m_second = Milestone::new("x", second, MilestoneKind::Countdown).unwrap();
        prop_assert_eq!(days_delta(&m_first, second), -days_delta(&m_second, first));
        prop_assert_eq!(days_delta(&m_first, second), a - b);
    }
}
