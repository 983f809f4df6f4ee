use chrono::NaiveDate;
use clap::Subcommand;
use pomotask_core::milestone::sort_for_display;
use pomotask_core::storage::{MilestoneFile, MilestoneStore};
use pomotask_core::{Milestone, MilestoneKind, MilestoneStatus};
use serde::Serialize;

use super::{print_json, reference_date, CliResult};

#[derive(Subcommand)]
pub enum MilestonesAction {
    /// List milestones with their day counts
    List {
        /// Count days from this date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Add a milestone, replacing any with the same name
    Add {
        name: String,
        /// Target date (YYYY-MM-DD)
        date: NaiveDate,
        /// countdown or anniversary; inferred from the date when omitted
        #[arg(long)]
        kind: Option<MilestoneKind>,
    },
    /// Remove a milestone by name
    Remove { name: String },
}

#[derive(Serialize)]
struct MilestoneView<'a> {
    #[serde(flatten)]
    milestone: &'a Milestone,
    days_delta: i64,
    status: MilestoneStatus,
}

pub fn run(action: MilestonesAction) -> CliResult {
    let mut file = MilestoneFile::open()?;

    match action {
        MilestonesAction::List { date, json } => {
            let today = reference_date(date);
            let mut milestones = file.load()?;
            sort_for_display(&mut milestones);
            let views: Vec<MilestoneView> = milestones
                .iter()
                .map(|m| MilestoneView {
                    milestone: m,
                    days_delta: pomotask_core::days_delta(m, today),
                    status: MilestoneStatus::of(m, today),
                })
                .collect();
            if json {
                return print_json(&views);
            }
            for view in views {
                println!(
                    "{:<30} {}  {}",
                    view.milestone.name, view.milestone.target_date, view.status
                );
            }
        }
        MilestonesAction::Add { name, date, kind } => {
            let kind = kind.unwrap_or_else(|| Milestone::infer_kind(date, reference_date(None)));
            let milestone = Milestone::new(name, date, kind)?;
            let mut milestones = file.load()?;
            milestones.retain(|m| m.name != milestone.name);
            milestones.push(milestone);
            file.save(&milestones)?;
            println!("ok");
        }
        MilestonesAction::Remove { name } => {
            let mut milestones = file.load()?;
            let before = milestones.len();
            milestones.retain(|m| m.name != name.trim());
            if milestones.len() == before {
                return Err(format!("no milestone named '{}'", name.trim()).into());
            }
            file.save(&milestones)?;
            println!("ok");
        }
    }
    Ok(())
}
