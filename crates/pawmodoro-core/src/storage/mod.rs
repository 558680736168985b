mod config;
pub mod database;
mod memory;

pub use config::{Config, EventsConfig, Preset, RewardConfig, TickConfig, MAX_PRESET_SECS};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, LedgerError};
use crate::ledger::{LedgerRecord, UserProgress};

/// Durable storage for the single user progress record and the
/// append-only session history.
///
/// Implementations need not be thread-safe; [`crate::ledger::Ledger`]
/// serializes all access behind one lock.
pub trait ProgressStore: Send {
    /// Load the progress record, creating (and persisting) a fresh one
    /// stamped with `now` if none exists.
    fn get_or_create(&mut self, now: DateTime<Utc>) -> Result<UserProgress, LedgerError>;

    fn save(&mut self, progress: &UserProgress) -> Result<(), LedgerError>;

    fn append_history(&mut self, record: &LedgerRecord) -> Result<(), LedgerError>;

    /// Most recent sessions first.
    fn fetch_history(&mut self, limit: usize) -> Result<Vec<LedgerRecord>, LedgerError>;

    /// Persist updated totals and the new history entry as one unit.
    fn commit_completion(
        &mut self,
        progress: &UserProgress,
        record: &LedgerRecord,
    ) -> Result<(), LedgerError> {
        self.save(progress)?;
        self.append_history(record)
    }
}

/// Returns `~/.config/pawmodoro[-dev]/` based on PAWMODORO_ENV.
///
/// Set PAWMODORO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PAWMODORO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pawmodoro-dev")
    } else {
        base_dir.join("pawmodoro")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
