//! Ledger over an on-disk SQLite store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pawmodoro_core::{
    Ledger, ManualClock, PetId, ProgressLedger, PurchaseOutcome, RewardPolicy, SqliteStore,
};
use tempfile::TempDir;

fn open(dir: &TempDir, clock: &ManualClock) -> Ledger<SqliteStore> {
    let store = SqliteStore::open_at(&dir.path().join("pawmodoro.db")).unwrap();
    Ledger::with_clock(store, RewardPolicy::default(), Arc::new(clock.clone()))
}

#[test]
fn progress_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());

    {
        let ledger = open(&dir, &clock);
        ledger.record_completion(1500.0, Some(&PetId::starter())).unwrap();
        clock.advance_secs(3600);
        ledger.record_completion(3000.0, None).unwrap();
        let dog = PetId::parse("dog").unwrap();
        assert_eq!(
            ledger.buy_pet(&dog).unwrap(),
            PurchaseOutcome::Purchased { balance: 250 }
        );
        ledger.set_active_pet(Some(&dog)).unwrap();
    }

    let ledger = open(&dir, &clock);
    let progress = ledger.progress().unwrap();
    assert_eq!(progress.coins, 250);
    assert_eq!(progress.total_completed, 2);
    assert_eq!(progress.current_streak, 1);
    assert_eq!(progress.active_pet, Some(PetId::parse("dog").unwrap()));
    assert!(progress.owns(&PetId::starter()));

    let history = ledger.history(10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].coins_earned, 500);
    assert_eq!(history[0].pet_used, None);
    assert_eq!(history[1].coins_earned, 250);
    assert_eq!(history[1].pet_used, Some(PetId::starter()));
}

#[test]
fn streak_grows_on_consecutive_days() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap());
    let ledger = open(&dir, &clock);

    for _ in 0..3 {
        ledger.record_completion(600.0, None).unwrap();
        clock.advance_secs(24 * 3600);
    }
    assert_eq!(ledger.stats().unwrap().current_streak, 3);

    clock.advance_secs(2 * 24 * 3600);
    ledger.record_completion(600.0, None).unwrap();
    assert_eq!(ledger.stats().unwrap().current_streak, 1);
}

#[test]
fn failed_purchase_leaves_balance_untouched() {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let ledger = open(&dir, &clock);
    ledger.record_completion(600.0, None).unwrap();

    let fox = PetId::parse("fox").unwrap();
    assert_eq!(
        ledger.buy_pet(&fox).unwrap(),
        PurchaseOutcome::InsufficientFunds {
            balance: 100,
            price: 1500
        }
    );
    assert_eq!(
        ledger.buy_pet(&PetId::starter()).unwrap(),
        PurchaseOutcome::AlreadyOwned
    );
    assert_eq!(ledger.stats().unwrap().coins, 100);
    assert!(!ledger.owns(&fox).unwrap());
}
