use chrono::NaiveDate;
use clap::Subcommand;
use pomotask_core::goal::upsert;
use pomotask_core::record::normalize_tag;
use pomotask_core::stats::{goal_progress, round_minutes};
use pomotask_core::storage::{GoalFile, GoalStore, SessionStore};
use pomotask_core::{Config, Goal, Period};

use super::{print_json, reference_date, session_store, CliResult};

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals
    List {
        #[arg(long)]
        json: bool,
    },
    /// Set (or replace) the goal for a tag
    Set {
        tag: String,
        /// Target minutes per period
        minutes: u32,
        /// week or month
        #[arg(long, default_value = "week")]
        period: Period,
    },
    /// Remove the goal for a tag
    Remove { tag: String },
    /// Progress of every goal in its current period
    Progress {
        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: GoalsAction) -> CliResult {
    let mut file = GoalFile::open()?;

    match action {
        GoalsAction::List { json } => {
            let goals = file.load()?;
            if json {
                return print_json(&goals.values().collect::<Vec<_>>());
            }
            if goals.is_empty() {
                println!("no goals set");
            }
            for goal in goals.values() {
                println!(
                    "{:<30} {:>6} min / {}",
                    goal.tag(),
                    goal.target_minutes_per_period(),
                    goal.period()
                );
            }
        }
        GoalsAction::Set { tag, minutes, period } => {
            let mut goals = file.load()?;
            let goal = Goal::new(&tag, minutes, period)?;
            if goal.tag().is_empty() {
                return Err("goal tag must not be empty".into());
            }
            upsert(&mut goals, goal);
            file.save(&goals)?;
            println!("ok");
        }
        GoalsAction::Remove { tag } => {
            let mut goals = file.load()?;
            let tag = normalize_tag(&tag);
            if goals.remove(&tag).is_none() {
                return Err(format!("no goal for tag '{tag}'").into());
            }
            file.save(&goals)?;
            println!("ok");
        }
        GoalsAction::Progress { date, json } => {
            let goals = file.load()?;
            let config = Config::load()?;
            let records = session_store(&config)?.read_all()?;
            let report = goal_progress(&records, &goals, reference_date(date));
            if json {
                return print_json(&report);
            }
            for (tag, progress) in &report.goals {
                println!(
                    "{:<30} {:>8.1} / {:>6} min  {:>5.1}%  ({})",
                    tag,
                    round_minutes(progress.recorded_minutes),
                    progress.target_minutes,
                    progress.fraction * 100.0,
                    progress.range.label()
                );
            }
        }
    }
    Ok(())
}
