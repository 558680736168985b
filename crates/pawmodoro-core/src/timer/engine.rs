//! Focus engine implementation.
//!
//! The engine is a wall-clock-based state machine. It owns no threads: a
//! [`Ticker`] calls back into `tick()` / `advance_frame()` (in practice via
//! [`super::FocusService`], which serializes every entry point).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Focusing -> Completed -> Idle     (natural expiry, rewarded)
//! Idle -> Focusing -> Idle                  (stop, no reward)
//! ```
//!
//! `Completed` only exists while completion side effects run; callers
//! between entry points always see `Idle` or `Focusing`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(clock, ledger, Box::new(ticker));
//! engine.start(FocusRequest::new("Work", "💼", 1500))?;
//! // every second:
//! engine.tick(); // Some(Event::SessionCompleted { .. }) at the end
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::format::{format_duration_label, format_remaining};
use super::session::{FocusRequest, Session};
use super::ticker::{Cadence, TickKind, Ticker};
use crate::clock::Clock;
use crate::error::FocusError;
use crate::events::{Event, EventSink};
use crate::ledger::{PetId, ProgressLedger};

/// Number of frames in the pet animation loop.
pub const FRAME_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Focusing,
    Completed,
}

/// Serializable view of the engine for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub session: Option<Session>,
    pub remaining_secs: Option<f64>,
    pub remaining_formatted: String,
    pub progress: f64,
    pub current_frame: u8,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// Core focus engine.
pub struct FocusEngine {
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn ProgressLedger>,
    ticker: Box<dyn Ticker>,
    sinks: Vec<Box<dyn EventSink>>,
    display_cadence: Cadence,
    frame_cadence: Cadence,
    phase: Phase,
    session: Option<Session>,
    last_tick_at: Option<DateTime<Utc>>,
    current_frame: u8,
    /// Highest progress handed out for the current session.
    reported_progress: f64,
}

impl FocusEngine {
    /// Create an idle engine with the default cadences.
    pub fn new(
        clock: Arc<dyn Clock>,
        ledger: Arc<dyn ProgressLedger>,
        ticker: Box<dyn Ticker>,
    ) -> Self {
        Self {
            clock,
            ledger,
            ticker,
            sinks: Vec::new(),
            display_cadence: default_display_cadence(),
            frame_cadence: default_frame_cadence(),
            phase: Phase::Idle,
            session: None,
            last_tick_at: None,
            current_frame: 0,
            reported_progress: 0.0,
        }
    }

    pub fn with_cadences(mut self, display: Cadence, frame: Cadence) -> Self {
        self.display_cadence = display;
        self.frame_cadence = frame;
        self
    }

    /// Register a presentation collaborator.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_frame(&self) -> u8 {
        self.current_frame
    }

    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
    }

    /// Seconds left in the running session (negative once overrun).
    pub fn remaining_secs(&self) -> Option<f64> {
        self.session
            .as_ref()
            .map(|s| s.remaining_secs(self.clock.now()))
    }

    /// `M:SS` countdown text; `0:00` when idle.
    pub fn remaining_formatted(&self) -> String {
        format_remaining(self.remaining_secs().unwrap_or(0.0))
    }

    /// 0.0 .. 1.0 progress within the running session; 0.0 when idle.
    pub fn progress(&self) -> f64 {
        match &self.session {
            Some(session) => session
                .progress_at(self.clock.now())
                .max(self.reported_progress),
            None => 0.0,
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let now = self.clock.now();
        let remaining_secs = self.session.as_ref().map(|s| s.remaining_secs(now));
        EngineSnapshot {
            phase: self.phase,
            session: self.session.clone(),
            remaining_secs,
            remaining_formatted: format_remaining(remaining_secs.unwrap_or(0.0)),
            progress: self.progress(),
            current_frame: self.current_frame,
            last_tick_at: self.last_tick_at,
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session. Never restarts or extends one that is running.
    pub fn start(&mut self, request: FocusRequest) -> Result<Event, FocusError> {
        if let Some(session) = &self.session {
            return Err(FocusError::AlreadyActive {
                ends_at: session.ends_at(),
            });
        }
        let duration_secs = request.validated_duration()?;
        let pet = self.resolve_pet(request.pet)?;

        let now = self.clock.now();
        let session = Session::begin(request.name, request.icon, duration_secs, now, pet)?;
        let event = Event::SessionStarted {
            name: session.name().to_string(),
            icon: session.icon().to_string(),
            total_duration_secs: duration_secs,
            duration_label: format_duration_label(duration_secs),
            ends_at: session.ends_at(),
            pet: session.pet().cloned(),
            at: now,
        };

        tracing::info!(
            name = session.name(),
            duration_secs,
            ends_at = %session.ends_at(),
            "focus session started"
        );

        self.session = Some(session);
        self.phase = Phase::Focusing;
        self.current_frame = 0;
        self.reported_progress = 0.0;
        self.last_tick_at = None;
        self.ticker.arm(TickKind::Display, self.display_cadence);
        self.ticker.arm(TickKind::Frame, self.frame_cadence);

        self.publish(&event);
        Ok(event)
    }

    /// Cancel the running session without reward. No-op when idle.
    pub fn stop(&mut self) -> Option<Event> {
        if let Err(e) = self.active_session() {
            tracing::debug!("stop ignored: {e}");
            return None;
        }
        let session = self.session.take()?;
        let now = self.clock.now();
        self.ticker.disarm_all();
        self.reset_to_idle();

        let elapsed_secs = session.elapsed_secs(now).max(0.0);
        tracing::info!(name = session.name(), elapsed_secs, "focus session stopped early");

        let event = Event::SessionStopped {
            name: session.name().to_string(),
            elapsed_secs,
            at: now,
        };
        self.publish(&event);
        Some(event)
    }

    /// The play/pause control. There is no real pause: while focusing
    /// this cancels the session exactly like [`FocusEngine::stop`].
    pub fn toggle_play_pause(&mut self) -> Option<Event> {
        match self.phase {
            Phase::Focusing => self.stop(),
            _ => None,
        }
    }

    /// Recompute the countdown. Completes the session once it has expired.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let (remaining, progress) = match self.active_session() {
            Ok(session) => (session.remaining_secs(now), session.progress_at(now)),
            Err(e) => {
                tracing::debug!("tick ignored: {e}");
                return None;
            }
        };

        if remaining <= 0.0 {
            return self.complete(now);
        }

        self.reported_progress = self.reported_progress.max(progress);
        self.last_tick_at = Some(now);
        let event = Event::Tick {
            remaining_secs: remaining,
            remaining_formatted: format_remaining(remaining),
            progress: self.reported_progress,
            at: now,
        };
        self.publish(&event);
        Some(event)
    }

    /// Step the pet animation. No-op when idle.
    pub fn advance_frame(&mut self) -> Option<Event> {
        let ends_at = self.active_session().ok()?.ends_at();
        self.current_frame = (self.current_frame + 1) % FRAME_COUNT;
        let event = Event::FrameAdvanced {
            frame: self.current_frame,
            ends_at,
            at: self.clock.now(),
        };
        self.publish(&event);
        Some(event)
    }

    /// Dispatch a tick by kind.
    pub fn on_tick(&mut self, kind: TickKind) -> Option<Event> {
        match kind {
            TickKind::Display => self.tick(),
            TickKind::Frame => self.advance_frame(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn active_session(&self) -> Result<&Session, FocusError> {
        match (&self.phase, &self.session) {
            (Phase::Focusing, Some(session)) => Ok(session),
            _ => Err(FocusError::NoActiveSession),
        }
    }

    fn resolve_pet(&self, requested: Option<PetId>) -> Result<Option<PetId>, FocusError> {
        match requested {
            Some(pet) => match self.ledger.owns(&pet) {
                Ok(true) => Ok(Some(pet)),
                Ok(false) => Err(FocusError::PetNotOwned(pet.to_string())),
                Err(e) => {
                    tracing::warn!(pet = %pet, "could not verify pet ownership: {e}");
                    Ok(Some(pet))
                }
            },
            None => Ok(self.ledger.active_pet().unwrap_or_else(|e| {
                tracing::warn!("could not read active pet: {e}");
                None
            })),
        }
    }

    /// Runs at most once per session: the phase check and the session
    /// `take()` both guard the ledger call.
    fn complete(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.phase != Phase::Focusing {
            return None;
        }
        let session = self.session.take()?;
        self.phase = Phase::Completed;

        let actual_duration_secs = session.elapsed_secs(now);
        let coins_earned = match self
            .ledger
            .record_completion(actual_duration_secs, session.pet())
        {
            Ok(record) => Some(record.coins_earned),
            Err(e) => {
                tracing::error!(
                    name = session.name(),
                    actual_duration_secs,
                    "failed to record session reward: {e}"
                );
                None
            }
        };
        self.ticker.disarm_all();

        tracing::info!(
            name = session.name(),
            actual_duration_secs,
            ?coins_earned,
            "focus session completed"
        );

        let event = Event::SessionCompleted {
            name: session.name().to_string(),
            actual_duration_secs,
            coins_earned,
            at: now,
        };
        self.publish(&event);
        self.reset_to_idle();
        Some(event)
    }

    fn reset_to_idle(&mut self) {
        self.phase = Phase::Idle;
        self.session = None;
        self.current_frame = 0;
        self.reported_progress = 0.0;
        self.last_tick_at = None;
    }

    fn publish(&self, event: &Event) {
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(event) {
                tracing::warn!("event delivery failed: {e}");
            }
        }
    }
}

impl Drop for FocusEngine {
    fn drop(&mut self) {
        self.ticker.disarm_all();
    }
}

pub fn default_display_cadence() -> Cadence {
    Cadence::Every(std::time::Duration::from_secs(1))
}

pub fn default_frame_cadence() -> Cadence {
    Cadence::Burst {
        fast: std::time::Duration::from_millis(500),
        window: std::time::Duration::from_secs(30),
        slow: std::time::Duration::from_secs(5),
    }
}
