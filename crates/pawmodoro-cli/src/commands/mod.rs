pub mod config;
pub mod focus;
pub mod pet;
pub mod shop;
pub mod stats;

use pawmodoro_core::{Config, CoreError, Ledger, SqliteStore};

/// Ledger over the on-disk store, paying out at the configured rate.
pub fn open_ledger(config: &Config) -> Result<Ledger<SqliteStore>, CoreError> {
    let store = SqliteStore::open()?;
    Ok(Ledger::new(store, config.reward_policy()))
}
