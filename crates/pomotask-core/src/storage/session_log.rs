//! Append-only JSON Lines session log.
//!
//! One record per line, written with a single `write_all` and synced before
//! `append` returns. Lines that fail to parse are skipped on read and logged,
//! so one hand-edited line never hides the rest of the history. A failed
//! write is rolled back to the previous length, and a tail that still ends
//! mid-line is terminated before the next record goes in.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::record::SessionRecord;

use super::{data_dir, SessionStore};

/// File name of the log inside the data directory.
pub const SESSION_LOG_FILE: &str = "sessions.jsonl";

#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Log at `<data_dir>/sessions.jsonl`.
    pub fn open() -> Result<Self, PersistenceError> {
        Ok(Self::at(data_dir()?.join(SESSION_LOG_FILE)))
    }

    /// Log at an explicit path. Nothing is created until the first append.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for SessionLog {
    fn append(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(record).map_err(|e| PersistenceError::Encode {
            what: "session record",
            message: e.to_string(),
        })?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let len = file.metadata().map_err(|e| self.io_err(e))?.len();
        if len > 0 && !ends_with_newline(&mut file).map_err(|e| self.io_err(e))? {
            warn!(path = %self.path.display(), "session log ends mid-line, terminating it");
            line.insert(0, '\n');
        }

        if let Err(e) = file.write_all(line.as_bytes()) {
            if let Err(truncate) = file.set_len(len) {
                warn!(path = %self.path.display(), error = %truncate, "could not roll back partial append");
            }
            return Err(self.io_err(e));
        }
        file.sync_data().map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), "appended session record");
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_err(e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping unreadable session log line"
                ),
            }
        }
        Ok(records)
    }
}

fn ends_with_newline(file: &mut std::fs::File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
