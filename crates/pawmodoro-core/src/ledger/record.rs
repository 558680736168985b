//! Durable ledger data: the per-user progress record and session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::PetId;

/// One completed focus session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: Uuid,
    pub actual_duration_secs: f64,
    pub coins_earned: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub pet_used: Option<PetId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedPet {
    pub id: PetId,
    pub price_paid: u64,
    pub purchased_at: DateTime<Utc>,
}

/// Cumulative progress for the single local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub coins: u64,
    pub total_completed: u64,
    pub current_streak: u32,
    pub last_session_at: Option<DateTime<Utc>>,
    pub owned_pets: Vec<OwnedPet>,
    pub active_pet: Option<PetId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    /// A fresh profile: no coins, the starter pet owned and active.
    pub fn new(now: DateTime<Utc>) -> Self {
        let starter = PetId::starter();
        Self {
            coins: 0,
            total_completed: 0,
            current_streak: 0,
            last_session_at: None,
            owned_pets: vec![OwnedPet {
                id: starter.clone(),
                price_paid: 0,
                purchased_at: now,
            }],
            active_pet: Some(starter),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owns(&self, pet: &PetId) -> bool {
        self.owned_pets.iter().any(|p| &p.id == pet)
    }
}

/// Result of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    Purchased { balance: u64 },
    InsufficientFunds { balance: u64, price: u64 },
    AlreadyOwned,
}

/// Read-only totals for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub coins: u64,
    pub total_completed: u64,
    pub current_streak: u32,
}

impl From<&UserProgress> for Stats {
    fn from(progress: &UserProgress) -> Self {
        Self {
            coins: progress.coins,
            total_completed: progress.total_completed,
            current_streak: progress.current_streak,
        }
    }
}
