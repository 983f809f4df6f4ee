//! Calendar windows used for bucketing: Monday-based weeks and calendar months.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Period::Week => "week",
            Period::Month => "month",
        })
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            other => Err(ValidationError::invalid(
                "period",
                format!("expected 'week' or 'month', got '{other}'"),
            )),
        }
    }
}

/// One concrete window. `start` and `end` are both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: Period,
}

impl PeriodRange {
    /// The week (Monday..Sunday) or month containing `date`.
    pub fn containing(period: Period, date: NaiveDate) -> Self {
        match period {
            Period::Week => {
                let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
                Self {
                    start,
                    end: start + Duration::days(6),
                    period,
                }
            }
            Period::Month => {
                let start = date - Duration::days(i64::from(date.day0()));
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(NaiveDate::MAX);
                Self { start, end, period }
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The window `n` periods later (negative `n` goes back).
    /// `None` only when the result falls outside chrono's date range.
    pub fn shift(&self, n: i32) -> Option<Self> {
        let anchor = match self.period {
            Period::Week => self
                .start
                .checked_add_signed(Duration::weeks(i64::from(n)))?,
            Period::Month => {
                let months = Months::new(n.unsigned_abs());
                if n >= 0 {
                    self.start.checked_add_months(months)?
                } else {
                    self.start.checked_sub_months(months)?
                }
            }
        };
        Some(Self::containing(self.period, anchor))
    }

    /// `2024-W01 (Jan 01-Jan 07)` for weeks (ISO week numbering), `2024-01` for months.
    pub fn label(&self) -> String {
        match self.period {
            Period::Week => {
                let iso = self.start.iso_week();
                format!(
                    "{}-W{:02} ({}-{})",
                    iso.year(),
                    iso.week(),
                    self.start.format("%b %d"),
                    self.end.format("%b %d")
                )
            }
            Period::Month => self.start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn sunday_belongs_to_the_week_that_started_monday_before() {
        let week = PeriodRange::containing(Period::Week, d(2024, 1, 7));
        assert_eq!(week.start, d(2024, 1, 1));
        assert_eq!(week.end, d(2024, 1, 7));
    }

    #[test]
    fn monday_starts_a_new_week() {
        let week = PeriodRange::containing(Period::Week, d(2024, 1, 8));
        assert_eq!(week.start, d(2024, 1, 8));
        assert_eq!(week.end, d(2024, 1, 14));
    }

    #[test]
    fn week_can_straddle_years() {
        let week = PeriodRange::containing(Period::Week, d(2025, 1, 1));
        assert_eq!(week.start, d(2024, 12, 30));
        assert_eq!(week.label(), "2025-W01 (Dec 30-Jan 05)");
    }

    #[test]
    fn month_has_variable_length() {
        assert_eq!(PeriodRange::containing(Period::Month, d(2024, 2, 15)).end, d(2024, 2, 29));
        assert_eq!(PeriodRange::containing(Period::Month, d(2023, 2, 1)).end, d(2023, 2, 28));
        assert_eq!(PeriodRange::containing(Period::Month, d(2024, 12, 31)).days(), 31);
        assert_eq!(PeriodRange::containing(Period::Month, d(2000, 2, 3)).days(), 29);
        assert_eq!(PeriodRange::containing(Period::Month, d(1900, 2, 3)).days(), 28);
        assert_eq!(PeriodRange::containing(Period::Month, d(2024, 4, 30)).end, d(2024, 4, 30));
        assert_eq!(PeriodRange::containing(Period::Month, NaiveDate::MAX).end, NaiveDate::MAX);
    }

    #[test]
    fn shift_moves_whole_periods() {
        let jan = PeriodRange::containing(Period::Month, d(2024, 1, 31));
        assert_eq!(jan.shift(1).unwrap().start, d(2024, 2, 1));
        assert_eq!(jan.shift(-1).unwrap().start, d(2023, 12, 1));

        let week = PeriodRange::containing(Period::Week, d(2024, 1, 3));
        assert_eq!(week.shift(-1).unwrap().start, d(2023, 12, 25));
    }

    #[test]
    fn labels() {
        let week = PeriodRange::containing(Period::Week, d(2024, 1, 3));
        assert_eq!(week.label(), "2024-W01 (Jan 01-Jan 07)");
        let month = PeriodRange::containing(Period::Month, d(2024, 3, 9));
        assert_eq!(month.label(), "2024-03");
    }

    #[test]
    fn period_parses() {
        assert_eq!("Weekly".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("month".parse::<Period>().unwrap(), Period::Month);
        assert!("year".parse::<Period>().is_err());
    }
}
