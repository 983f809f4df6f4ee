use chrono::NaiveDate;
use clap::{Args, Subcommand};
use pomotask_core::stats::{aggregate, round_minutes, Aggregation, Period, PeriodRange};
use pomotask_core::storage::SessionStore;
use pomotask_core::Config;

use super::{print_json, reference_date, session_store, CliResult};

#[derive(Args)]
pub struct ViewArgs {
    /// Reference date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Periods to move from the reference date (-1 = previous)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i32,
    /// Show every period with recorded time, not just the selected one
    #[arg(long)]
    history: bool,
    /// Print the full aggregation as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// Totals for the week (Monday to Sunday)
    Week(ViewArgs),
    /// Totals for the calendar month
    Month(ViewArgs),
}

pub fn run(action: StatsAction) -> CliResult {
    let (period, args) = match action {
        StatsAction::Week(args) => (Period::Week, args),
        StatsAction::Month(args) => (Period::Month, args),
    };

    let config = Config::load()?;
    let records = session_store(&config)?.read_all()?;

    let selected = PeriodRange::containing(period, reference_date(args.date))
        .shift(args.offset)
        .ok_or("offset moves outside the supported date range")?;
    let view = aggregate(&records, period, selected.start);

    if args.json {
        return print_json(&view);
    }

    if args.history {
        let mut starts: Vec<NaiveDate> = view.buckets.iter().map(|b| b.period_start).collect();
        starts.dedup();
        for start in starts {
            print_period(&view, PeriodRange::containing(period, start));
        }
    } else {
        print_period(&view, view.current);
    }

    for diagnostic in &view.diagnostics {
        eprintln!(
            "skipped record #{} ({}): {}",
            diagnostic.index + 1,
            diagnostic.start_timestamp.format("%Y-%m-%d %H:%M"),
            diagnostic.error
        );
    }
    Ok(())
}

fn print_period(view: &Aggregation, range: PeriodRange) {
    println!("{}", range.label());
    let mut total = 0.0;
    for bucket in view.buckets.iter().filter(|b| b.period_start == range.start) {
        let Some(tag) = &bucket.tag else {
            continue;
        };
        let label = if tag.is_empty() { "(untagged)" } else { tag.as_str() };
        println!("  {label:<30} {:>8.1} min", round_minutes(bucket.total_minutes));
        total += bucket.total_minutes;
    }
    println!("  {:<30} {:>8.1} min", "Total", round_minutes(total));
}
