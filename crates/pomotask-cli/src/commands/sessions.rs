use clap::Subcommand;
use pomotask_core::storage::SessionStore;
use pomotask_core::timer::format_clock;
use pomotask_core::Config;

use super::{print_json, session_store, CliResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// Most recent sessions, newest last
    List {
        /// Number of sessions to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionsAction) -> CliResult {
    let config = Config::load()?;
    let records = session_store(&config)?.read_all()?;

    match action {
        SessionsAction::List { limit, json } => {
            let recent = &records[records.len().saturating_sub(limit)..];
            if json {
                return print_json(&recent);
            }
            for record in recent {
                println!(
                    "{}  {:<11} {:>6}  {:<20} {}",
                    record.start_timestamp.format("%Y-%m-%d %H:%M"),
                    record.mode.title(),
                    format_clock(u64::try_from(record.duration_seconds).unwrap_or(0)),
                    record.tag,
                    record.note_preview()
                );
            }
        }
    }
    Ok(())
}
