//! Core error types for pomotask-core.
//!
//! Every failure the core can report is one of these variants. None of them
//! is fatal: callers (the CLI or any GUI shell) display them and carry on.
//! Malformed session records met during aggregation are not errors here;
//! they become [`crate::stats::AggregationInputError`] diagnostics.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerState;

/// Core error type for pomotask-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A value supplied by the caller was rejected before anything was stored.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    /// A store append/load/save failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer command issued in a state that does not accept it.
    #[error("Cannot {operation} while the timer is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: TimerState,
    },
}

/// Failures of the session, goal and milestone stores.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing a store file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// SQLite-backed store failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A value could not be encoded for storage
    #[error("Failed to encode {what}: {message}")]
    Encode { what: &'static str, message: String },

    /// A store file exists but could not be decoded
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A required text field was empty
    #[error("'{0}' must not be empty")]
    Empty(String),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
