//! In-memory progress store. Used by tests and as the reference
//! implementation of [`ProgressStore`].

use chrono::{DateTime, Utc};

use super::ProgressStore;
use crate::error::LedgerError;
use crate::ledger::{LedgerRecord, UserProgress};

#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: Option<UserProgress>,
    history: Vec<LedgerRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing progress record.
    pub fn with_progress(progress: UserProgress) -> Self {
        Self {
            progress: Some(progress),
            history: Vec::new(),
        }
    }
}

impl ProgressStore for MemoryStore {
    fn get_or_create(&mut self, now: DateTime<Utc>) -> Result<UserProgress, LedgerError> {
        Ok(self
            .progress
            .get_or_insert_with(|| UserProgress::new(now))
            .clone())
    }

    fn save(&mut self, progress: &UserProgress) -> Result<(), LedgerError> {
        self.progress = Some(progress.clone());
        Ok(())
    }

    fn append_history(&mut self, record: &LedgerRecord) -> Result<(), LedgerError> {
        self.history.push(record.clone());
        Ok(())
    }

    fn fetch_history(&mut self, limit: usize) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut records = self.history.clone();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records.truncate(limit);
        Ok(records)
    }
}
