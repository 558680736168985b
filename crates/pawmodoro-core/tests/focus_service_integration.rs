//! Integration tests for the focus service on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use pawmodoro_core::{
    ChannelSink, CoreError, EngineParts, Event, FocusError, FocusHandle, FocusRequest,
    FocusService, Ledger, ManualClock, MemoryStore, Phase, RewardPolicy,
};
use tokio::sync::mpsc;

struct Fixture {
    handle: FocusHandle,
    clock: ManualClock,
    ledger: Arc<Ledger<MemoryStore>>,
    events: mpsc::Receiver<Event>,
}

fn spawn_service() -> Fixture {
    let clock = ManualClock::default();
    let ledger = Arc::new(Ledger::with_clock(
        MemoryStore::new(),
        RewardPolicy::default(),
        Arc::new(clock.clone()),
    ));
    let (sink, events) = ChannelSink::new(256);
    let parts = EngineParts::new(Arc::new(clock.clone()), ledger.clone()).with_sink(Box::new(sink));
    let handle = FocusService::spawn(parts).unwrap();
    Fixture {
        handle,
        clock,
        ledger,
        events,
    }
}

fn drain(events: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn ticker_completes_expired_session() {
    let mut fx = spawn_service();
    fx.handle
        .start(FocusRequest::new("Coffee", "☕️", 300))
        .await
        .unwrap();

    fx.clock.advance_secs(300);
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let snapshot = fx.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(fx.ledger.stats().unwrap().coins, 50);

    let completed: Vec<_> = drain(&mut fx.events)
        .into_iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .collect();
    assert_eq!(completed.len(), 1);
    assert!(matches!(
        completed[0],
        Event::SessionCompleted { coins_earned: Some(50), .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn display_ticks_flow_while_focusing() {
    let mut fx = spawn_service();
    fx.handle
        .start(FocusRequest::new("Work", "💼", 1500))
        .await
        .unwrap();

    fx.clock.advance_secs(3);
    tokio::time::sleep(Duration::from_millis(3100)).await;

    let events = drain(&mut fx.events);
    assert!(matches!(events.first(), Some(Event::SessionStarted { .. })));
    assert!(events.iter().any(|e| matches!(e, Event::Tick { .. })));
    assert!(events.iter().any(|e| matches!(e, Event::FrameAdvanced { .. })));

    let snapshot = fx.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Phase::Focusing);
    assert_eq!(snapshot.remaining_formatted, "24:57");
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_through_handle() {
    let fx = spawn_service();
    fx.handle
        .start(FocusRequest::new("Work", "💼", 1500))
        .await
        .unwrap();

    let err = fx
        .handle
        .start(FocusRequest::new("Nap", "🛏️", 60))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Focus(FocusError::AlreadyActive { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn oversized_duration_keeps_service_alive() {
    let fx = spawn_service();
    let err = fx
        .handle
        .start(FocusRequest::new("Work", "💼", i64::MAX))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Focus(FocusError::InvalidDuration(i64::MAX))
    ));

    fx.handle
        .start(FocusRequest::new("Work", "💼", 60))
        .await
        .unwrap();
    assert_eq!(fx.handle.snapshot().await.unwrap().phase, Phase::Focusing);
}

#[tokio::test(start_paused = true)]
async fn handle_stop_cancels_without_reward() {
    let fx = spawn_service();
    fx.handle
        .start(FocusRequest::new("Work", "💼", 1500))
        .await
        .unwrap();
    fx.clock.advance_secs(600);

    let stopped = fx.handle.stop().await.unwrap();
    assert!(matches!(stopped, Some(Event::SessionStopped { .. })));
    assert!(fx.handle.stop().await.unwrap().is_none());

    fx.clock.advance_secs(1000);
    tokio::time::sleep(Duration::from_secs(5)).await;
    let stats = fx.ledger.stats().unwrap();
    assert_eq!(stats.coins, 0);
    assert_eq!(stats.total_completed, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_signal_matches_in_app_stop() {
    let mut fx = spawn_service();
    let signal = fx.handle.stop_signal();
    fx.handle
        .start(FocusRequest::new("Work", "💼", 1500))
        .await
        .unwrap();
    fx.clock.advance_secs(600);

    signal.trigger().await.unwrap();
    let snapshot = fx.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Phase::Idle);

    fx.clock.advance_secs(1000);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fx.ledger.stats().unwrap().coins, 0);

    let events = drain(&mut fx.events);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionStopped { elapsed_secs, .. } if *elapsed_secs == 600.0)));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::SessionCompleted { .. })));
}

#[tokio::test(start_paused = true)]
async fn toggle_play_pause_stops_session() {
    let fx = spawn_service();
    assert!(fx.handle.toggle_play_pause().await.unwrap().is_none());

    fx.handle
        .start(FocusRequest::new("Sport", "⚽️", 3600))
        .await
        .unwrap();
    let event = fx.handle.toggle_play_pause().await.unwrap();
    assert!(matches!(event, Some(Event::SessionStopped { .. })));
    assert_eq!(fx.handle.snapshot().await.unwrap().phase, Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn dropping_handles_stops_service() {
    let fx = spawn_service();
    let signal = fx.handle.stop_signal();
    fx.handle
        .start(FocusRequest::new("Work", "💼", 1500))
        .await
        .unwrap();
    drop(fx.handle);
    drop(signal);

    fx.clock.advance_secs(1500);
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(fx.ledger.stats().unwrap().total_completed, 0);
}
