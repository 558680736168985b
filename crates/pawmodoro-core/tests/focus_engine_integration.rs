//! Integration tests for the focus engine driving a real ledger.

use std::sync::{Arc, Mutex};

use pawmodoro_core::{
    Event, EventSink, FocusEngine, FocusError, FocusRequest, Ledger, ManualClock, ManualTicker,
    MemoryStore, Phase, PetId, RewardPolicy, SinkError, TickKind, Ticker,
};
use proptest::prelude::*;

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<Event>>>);

impl RecordingSink {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct BrokenSink;

impl EventSink for BrokenSink {
    fn deliver(&self, _event: &Event) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }
}

struct Harness {
    engine: FocusEngine,
    clock: ManualClock,
    ticker: ManualTicker,
    ledger: Arc<Ledger<MemoryStore>>,
    sink: RecordingSink,
}

fn harness() -> Harness {
    let clock = ManualClock::default();
    let ticker = ManualTicker::new();
    let ledger = Arc::new(Ledger::with_clock(
        MemoryStore::new(),
        RewardPolicy::default(),
        Arc::new(clock.clone()),
    ));
    let sink = RecordingSink::default();
    let mut engine = FocusEngine::new(
        Arc::new(clock.clone()),
        ledger.clone(),
        Box::new(ticker.clone()),
    );
    engine.subscribe(Box::new(sink.clone()));
    Harness {
        engine,
        clock,
        ticker,
        ledger,
        sink,
    }
}

#[test]
fn coffee_session_end_to_end() {
    let mut h = harness();
    h.engine
        .start(FocusRequest::new("Coffee", "☕️", 300))
        .unwrap();
    h.clock.advance_secs(300);

    let event = h.engine.tick().unwrap();
    match event {
        Event::SessionCompleted {
            name,
            actual_duration_secs,
            coins_earned,
            ..
        } => {
            assert_eq!(name, "Coffee");
            assert_eq!(actual_duration_secs, 300.0);
            assert_eq!(coins_earned, Some(50));
        }
        other => panic!("expected SessionCompleted, got {other:?}"),
    }

    assert_eq!(h.engine.phase(), Phase::Idle);
    let stats = h.ledger.stats().unwrap();
    assert_eq!(stats.coins, 50);
    assert_eq!(stats.total_completed, 1);

    let history = h.ledger.history(10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].actual_duration_secs, 300.0);
    assert_eq!(history[0].pet_used, Some(PetId::starter()));
}

#[test]
fn pomodoro_pays_250_coins() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 1500)).unwrap();
    h.clock.advance_secs(1500);
    h.engine.tick();
    assert_eq!(h.ledger.stats().unwrap().coins, 250);
}

#[test]
fn fresh_session_shows_full_duration() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 1500)).unwrap();
    assert_eq!(h.engine.progress(), 0.0);
    assert_eq!(h.engine.remaining_formatted(), "25:00");

    let started = h.sink.events();
    assert!(matches!(
        started.as_slice(),
        [Event::SessionStarted { duration_label, .. }] if duration_label == "25 min"
    ));
}

#[test]
fn started_event_carries_absolute_end_time() {
    let mut h = harness();
    let event = h.engine.start(FocusRequest::new("Nap", "🛏️", 1200)).unwrap();
    let session_end = h.engine.session().unwrap().ends_at();
    match event {
        Event::SessionStarted { ends_at, at, .. } => {
            assert_eq!(ends_at, session_end);
            assert_eq!((ends_at - at).num_seconds(), 1200);
        }
        other => panic!("expected SessionStarted, got {other:?}"),
    }
}

#[test]
fn progress_reaches_one_at_end_time() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 10)).unwrap();
    h.clock.advance_secs(10);
    assert_eq!(h.engine.progress(), 1.0);
    assert_eq!(h.engine.remaining_formatted(), "0:00");
}

#[test]
fn stop_never_rewards() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 1500)).unwrap();
    h.clock.advance_secs(1499);
    let event = h.engine.stop().unwrap();
    assert!(event.is_terminal());

    h.clock.advance_secs(10);
    assert!(h.engine.tick().is_none());

    let stats = h.ledger.stats().unwrap();
    assert_eq!(stats.coins, 0);
    assert_eq!(stats.total_completed, 0);
    assert!(!h.ticker.is_armed(TickKind::Display));
}

#[test]
fn repeated_ticks_after_expiry_reward_once() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 120)).unwrap();
    h.clock.advance_secs(125);

    assert!(h.engine.tick().is_some());
    for _ in 0..5 {
        assert!(h.engine.tick().is_none());
    }

    let stats = h.ledger.stats().unwrap();
    assert_eq!(stats.total_completed, 1);
    assert_eq!(stats.coins, 20);
    let completions = h
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn overrun_is_rewarded_on_actual_duration() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 590)).unwrap();
    h.clock.advance_secs(601);
    h.engine.tick();
    let history = h.ledger.history(1).unwrap();
    assert_eq!(history[0].actual_duration_secs, 601.0);
    assert_eq!(history[0].coins_earned, 100);
}

#[test]
fn start_while_focusing_is_rejected() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 1500)).unwrap();
    let ends_at = h.engine.session().unwrap().ends_at();
    h.clock.advance_secs(100);

    let err = h
        .engine
        .start(FocusRequest::new("Nap", "🛏️", 60))
        .unwrap_err();
    assert_eq!(err, FocusError::AlreadyActive { ends_at });
    assert_eq!(h.engine.session().unwrap().ends_at(), ends_at);
    assert_eq!(h.engine.session().unwrap().name(), "Work");
    assert_eq!(h.ticker.arm_calls(TickKind::Display), 1);
}

#[test]
fn invalid_durations_are_rejected() {
    let mut h = harness();
    for secs in [0, -1, -1500] {
        assert_eq!(
            h.engine.start(FocusRequest::new("Work", "💼", secs)),
            Err(FocusError::InvalidDuration(secs))
        );
    }
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert!(h.sink.events().is_empty());
}

#[test]
fn oversized_durations_are_rejected_without_panicking() {
    let mut h = harness();
    for secs in [10_000_000_000_000, i64::MAX] {
        assert_eq!(
            h.engine.start(FocusRequest::new("Work", "💼", secs)),
            Err(FocusError::InvalidDuration(secs))
        );
    }
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert!(!h.ticker.is_armed(TickKind::Display));

    h.engine.start(FocusRequest::new("Work", "💼", 60)).unwrap();
    assert_eq!(h.engine.phase(), Phase::Focusing);
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let mut h = harness();
    assert!(h.engine.stop().is_none());
    assert!(h.engine.tick().is_none());
    assert_eq!(h.engine.phase(), Phase::Idle);
    assert!(h.sink.events().is_empty());
}

#[test]
fn session_can_restart_after_stop() {
    let mut h = harness();
    h.engine.start(FocusRequest::new("Work", "💼", 60)).unwrap();
    h.engine.stop();
    h.engine.start(FocusRequest::new("Nap", "🛏️", 60)).unwrap();
    assert_eq!(h.engine.session().unwrap().name(), "Nap");
}

#[test]
fn purchased_pet_accompanies_session() {
    let mut h = harness();
    let dog = PetId::parse("dog").unwrap();

    assert_eq!(
        h.engine
            .start(FocusRequest::new("Work", "💼", 60).with_pet(dog.clone())),
        Err(FocusError::PetNotOwned("dog".into()))
    );

    h.engine.start(FocusRequest::new("Work", "💼", 3000)).unwrap();
    h.clock.advance_secs(3000);
    h.engine.tick();
    h.ledger.buy_pet(&dog).unwrap();

    h.engine
        .start(FocusRequest::new("Work", "💼", 60).with_pet(dog.clone()))
        .unwrap();
    h.clock.advance_secs(60);
    h.engine.tick();
    assert_eq!(h.ledger.history(1).unwrap()[0].pet_used, Some(dog));
}

#[test]
fn failing_sink_does_not_break_engine() {
    let mut h = harness();
    h.engine.subscribe(Box::new(BrokenSink));
    h.engine.start(FocusRequest::new("Work", "💼", 60)).unwrap();
    h.clock.advance_secs(60);
    assert!(h.engine.tick().is_some());
    assert_eq!(h.ledger.stats().unwrap().coins, 10);
}

proptest! {
    #[test]
    fn progress_is_monotonic_across_ticks(
        duration in 1i64..7200,
        steps in proptest::collection::vec(0i64..120, 1..40),
    ) {
        let mut h = harness();
        h.engine.start(FocusRequest::new("Work", "💼", duration)).unwrap();
        prop_assert_eq!(h.engine.progress(), 0.0);

        let mut last = 0.0;
        for step in steps {
            h.clock.advance_secs(step);
            match h.engine.tick() {
                Some(Event::Tick { progress, .. }) => {
                    prop_assert!(progress >= last);
                    prop_assert!(progress < 1.0);
                    last = progress;
                }
                Some(Event::SessionCompleted { .. }) => break,
                None => break,
                Some(other) => prop_assert!(false, "unexpected event {:?}", other),
            }
        }
    }
}
