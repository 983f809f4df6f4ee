//! Persistence contracts and their implementations.
//!
//! The core only needs three narrow interfaces:
//! - [`SessionStore`]: append one record, read all records in append order
//! - [`GoalStore`]: load/save the whole tag -> goal mapping
//! - [`MilestoneStore`]: load/save the whole milestone list
//!
//! Writes are synchronous and single-writer. Whole-collection saves go
//! through [`write_atomic`] so a failed save leaves the previous file intact.

mod config;
pub mod database;
mod goals;
mod memory;
mod milestones;
mod session_log;

pub use config::{Config, SessionBackend, StorageConfig, TagsConfig};
pub use database::Database;
pub use goals::GoalFile;
pub use memory::MemorySessionStore;
pub use milestones::MilestoneFile;
pub use session_log::SessionLog;

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PersistenceError, Result};
use crate::goal::Goals;
use crate::milestone::Milestone;
use crate::record::SessionRecord;

/// Append-only log of finished sessions.
pub trait SessionStore {
    /// Durably append one record.
    fn append(&mut self, record: &SessionRecord) -> Result<(), PersistenceError>;

    /// All records, in append order.
    fn read_all(&self) -> Result<Vec<SessionRecord>, PersistenceError>;
}

/// Whole-collection persistence of goals.
pub trait GoalStore {
    /// Fails with `InvalidConfiguration` if a stored goal is invalid.
    fn load(&self) -> Result<Goals>;

    fn save(&mut self, goals: &Goals) -> Result<(), PersistenceError>;
}

/// Whole-collection persistence of milestones.
pub trait MilestoneStore {
    fn load(&self) -> Result<Vec<Milestone>>;

    fn save(&mut self, milestones: &[Milestone]) -> Result<(), PersistenceError>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn append(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        (**self).append(record)
    }

    fn read_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        (**self).read_all()
    }
}

/// Returns the data directory.
///
/// `POMOTASK_DATA_DIR` wins when set. Otherwise `~/.config/pomotask[-dev]/`,
/// with `POMOTASK_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, PersistenceError> {
    let dir = match std::env::var_os("POMOTASK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTASK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotask-dev")
            } else {
                base_dir.join("pomotask")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| PersistenceError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);
    std::fs::rename(&tmp, path).map_err(io_err)
}
