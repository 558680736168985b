//! Core error types for pawmodoro-core.
//!
//! This module defines the error hierarchy using thiserror. Each subsystem
//! has its own enum; [`CoreError`] wraps them for callers that do not care
//! which layer failed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for pawmodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Focus engine rejected a command
    #[error("Focus error: {0}")]
    Focus(#[from] FocusError),

    /// Reward ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Focus service errors
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Errors returned by the focus engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FocusError {
    /// Requested duration is zero or negative
    #[error("Invalid duration: {0}s (must be a positive number of seconds)")]
    InvalidDuration(i64),

    /// A session is already running
    #[error("A focus session is already active (ends at {ends_at})")]
    AlreadyActive { ends_at: DateTime<Utc> },

    /// Stop/tick requested while idle. Benign; never surfaced to the user.
    #[error("No active focus session")]
    NoActiveSession,

    /// The requested pet is not in the user's collection
    #[error("Pet '{0}' is not owned")]
    PetNotOwned(String),
}

/// Errors returned by the reward ledger and progress stores.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Item id does not exist in the catalog
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    /// Item exists but the user does not own it
    #[error("Item '{0}' is not owned")]
    NotOwned(String),

    /// Generic store failure
    #[error("Progress store failure: {0}")]
    Store(String),

    /// SQLite-backed store failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Store lock was poisoned by a panicking writer
    #[error("Progress store lock poisoned")]
    Poisoned,
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored row could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No preset with that name
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// Errors talking to a running focus service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service task has exited
    #[error("Focus service is not running")]
    Closed,

    /// Service construction needs a tokio runtime
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Database(err.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for LedgerError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        LedgerError::Poisoned
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_error_converts_into_core_error() {
        let err: CoreError = FocusError::InvalidDuration(-5).into();
        assert!(matches!(err, CoreError::Focus(FocusError::InvalidDuration(-5))));
        assert!(err.to_string().contains("-5s"));
    }

    #[test]
    fn rusqlite_error_maps_to_query_failed() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn poison_maps_to_poisoned() {
        let lock = std::sync::Mutex::new(0);
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: LedgerError = lock.lock().unwrap_err().into();
        assert!(matches!(err, LedgerError::Poisoned));
    }
}
