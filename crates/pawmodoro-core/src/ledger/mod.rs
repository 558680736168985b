//! Reward ledger.
//!
//! The focus engine reports completed sessions through [`ProgressLedger`];
//! it never touches storage directly. [`Ledger`] is the standard
//! implementation over any [`ProgressStore`].
//!
//! All reads and writes go through a single lock, so a reader never sees a
//! coin total that has been credited without the matching session count.

mod catalog;
mod record;
mod streak;

pub use catalog::{Catalog, PetEntry, PetId};
pub use record::{LedgerRecord, OwnedPet, PurchaseOutcome, Stats, UserProgress};
pub use streak::next_streak;

use std::sync::{Arc, Mutex};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::storage::ProgressStore;

/// Coins granted per whole focused minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    pub coins_per_minute: u64,
}

impl RewardPolicy {
    pub const fn new(coins_per_minute: u64) -> Self {
        Self { coins_per_minute }
    }

    /// `floor(secs / 60) * coins_per_minute`. Negative or NaN durations earn nothing.
    pub fn coins_for(&self, actual_duration_secs: f64) -> u64 {
        if !(actual_duration_secs > 0.0) {
            return 0;
        }
        let minutes = (actual_duration_secs / 60.0).floor() as u64;
        minutes.saturating_mul(self.coins_per_minute)
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

/// What the focus engine needs from the reward side.
pub trait ProgressLedger: Send + Sync {
    /// Credit a naturally completed session and append it to history.
    fn record_completion(
        &self,
        actual_duration_secs: f64,
        pet_used: Option<&PetId>,
    ) -> Result<LedgerRecord, LedgerError>;

    /// Atomic check-then-debit. Never leaves the balance negative.
    fn purchase(&self, item: &PetId, price: u64) -> Result<PurchaseOutcome, LedgerError>;

    fn owns(&self, item: &PetId) -> Result<bool, LedgerError>;

    fn active_pet(&self) -> Result<Option<PetId>, LedgerError>;
}

/// Ledger backed by a [`ProgressStore`].
pub struct Ledger<S> {
    store: Mutex<S>,
    policy: RewardPolicy,
    clock: Arc<dyn Clock>,
}

impl<S: ProgressStore> Ledger<S> {
    pub fn new(store: S, policy: RewardPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, policy: RewardPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(store),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    /// Current progress record (created on first access).
    pub fn progress(&self) -> Result<UserProgress, LedgerError> {
        let mut store = self.store.lock()?;
        store.get_or_create(self.clock.now())
    }

    pub fn stats(&self) -> Result<Stats, LedgerError> {
        Ok(Stats::from(&self.progress()?))
    }

    pub fn history(&self, limit: usize) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut store = self.store.lock()?;
        store.fetch_history(limit)
    }

    /// Buy a pet at its catalog price.
    pub fn buy_pet(&self, pet: &PetId) -> Result<PurchaseOutcome, LedgerError> {
        let entry = pet
            .entry()
            .ok_or_else(|| LedgerError::UnknownItem(pet.to_string()))?;
        self.purchase(pet, entry.price)
    }

    /// Choose the pet that accompanies future sessions.
    pub fn set_active_pet(&self, pet: Option<&PetId>) -> Result<(), LedgerError> {
        let mut store = self.store.lock()?;
        let now = self.clock.now();
        let mut progress = store.get_or_create(now)?;
        if let Some(pet) = pet {
            if !progress.owns(pet) {
                return Err(LedgerError::NotOwned(pet.to_string()));
            }
        }
        progress.active_pet = pet.cloned();
        progress.updated_at = now;
        store.save(&progress)
    }
}

impl<S: ProgressStore> ProgressLedger for Ledger<S> {
    fn record_completion(
        &self,
        actual_duration_secs: f64,
        pet_used: Option<&PetId>,
    ) -> Result<LedgerRecord, LedgerError> {
        let mut store = self.store.lock()?;
        let now = self.clock.now();
        let mut progress = store.get_or_create(now)?;

        let coins_earned = self.policy.coins_for(actual_duration_secs);
        let elapsed_ms = (actual_duration_secs.max(0.0) * 1000.0).round() as i64;

        let record = LedgerRecord {
            id: Uuid::new_v4(),
            actual_duration_secs,
            coins_earned,
            started_at: now - Duration::milliseconds(elapsed_ms),
            completed_at: now,
            pet_used: pet_used.cloned(),
        };

        progress.coins = progress.coins.saturating_add(coins_earned);
        progress.total_completed += 1;
        progress.current_streak =
            next_streak(progress.current_streak, progress.last_session_at, now);
        progress.last_session_at = Some(now);
        progress.updated_at = now;

        store.commit_completion(&progress, &record)?;
        tracing::info!(
            coins_earned,
            total_coins = progress.coins,
            streak = progress.current_streak,
            "session reward recorded"
        );
        Ok(record)
    }

    fn purchase(&self, item: &PetId, price: u64) -> Result<PurchaseOutcome, LedgerError> {
        let mut store = self.store.lock()?;
        let now = self.clock.now();
        let mut progress = store.get_or_create(now)?;

        if progress.owns(item) {
            return Ok(PurchaseOutcome::AlreadyOwned);
        }
        if progress.coins < price {
            tracing::debug!(item = %item, price, balance = progress.coins, "insufficient funds");
            return Ok(PurchaseOutcome::InsufficientFunds {
                balance: progress.coins,
                price,
            });
        }

        progress.coins -= price;
        progress.owned_pets.push(OwnedPet {
            id: item.clone(),
            price_paid: price,
            purchased_at: now,
        });
        progress.updated_at = now;
        store.save(&progress)?;

        tracing::info!(item = %item, price, balance = progress.coins, "pet purchased");
        Ok(PurchaseOutcome::Purchased {
            balance: progress.coins,
        })
    }

    fn owns(&self, item: &PetId) -> Result<bool, LedgerError> {
        Ok(self.progress()?.owns(item))
    }

    fn active_pet(&self) -> Result<Option<PetId>, LedgerError> {
        Ok(self.progress()?.active_pet)
    }
}
