//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Finished session records (an alternative to the JSON Lines log)
//! - Key-value store for application state, such as the serialized timer

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rusqlite::{params, Connection};

use crate::error::{DatabaseError, PersistenceError};
use crate::record::{EndReason, SessionMode, SessionRecord};

use super::{data_dir, SessionStore};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "pomotask.db";

/// SQLite database for session records and app state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pomotask.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, PersistenceError> {
        Self::open_at(data_dir()?.join(DATABASE_FILE))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                start_timestamp  TEXT NOT NULL,
                end_timestamp    TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                tag              TEXT NOT NULL DEFAULT '',
                note             TEXT NOT NULL DEFAULT '',
                mode             TEXT NOT NULL,
                ended_by         TEXT NOT NULL DEFAULT 'completed'
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start_timestamp);
            CREATE INDEX IF NOT EXISTS idx_sessions_tag ON sessions(tag);",
        )?;
        Ok(())
    }

    /// Number of stored session records.
    pub fn session_count(&self) -> Result<u64, PersistenceError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get::<_, u64>(0))?;
        Ok(count)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn ended_by_str(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Completed => "completed",
        EndReason::Stopped => "stopped",
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Local>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

impl SessionStore for Database {
    fn append(&mut self, record: &SessionRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            "INSERT INTO sessions
                (start_timestamp, end_timestamp, duration_seconds, tag, note, mode, ended_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.start_timestamp.to_rfc3339(),
                record.end_timestamp.to_rfc3339(),
                record.duration_seconds,
                record.tag,
                record.note,
                record.mode.as_str(),
                ended_by_str(record.ended_by),
            ],
        )?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<SessionRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT start_timestamp, end_timestamp, duration_seconds, tag, note, mode, ended_by
             FROM sessions
             ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (start, end, duration_seconds, tag, note, mode, ended_by) = row?;
            let mode: SessionMode = mode
                .parse()
                .map_err(|e| DatabaseError::QueryFailed(format!("bad mode: {e}")))?;
            records.push(SessionRecord {
                start_timestamp: parse_timestamp(&start)?,
                end_timestamp: parse_timestamp(&end)?,
                duration_seconds,
                tag,
                note,
                mode,
                ended_by: if ended_by == "stopped" {
                    EndReason::Stopped
                } else {
                    EndReason::Completed
                },
            });
        }
        Ok(records)
    }
}
