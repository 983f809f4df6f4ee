pub mod config;
pub mod goals;
pub mod milestones;
pub mod sessions;
pub mod stats;
pub mod timer;

use chrono::{Local, NaiveDate};
use pomotask_core::storage::{Database, SessionBackend, SessionLog, SessionStore};
use pomotask_core::Config;
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// The session store selected by `storage.session_backend`.
pub fn session_store(config: &Config) -> CliResult<Box<dyn SessionStore>> {
    let store: Box<dyn SessionStore> = match config.storage.session_backend {
        SessionBackend::Log => Box::new(SessionLog::open()?),
        SessionBackend::Sqlite => Box::new(Database::open()?),
    };
    Ok(store)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `date` or today's local date.
pub fn reference_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}
