//! Single-owner focus service.
//!
//! One tokio task owns the [`FocusEngine`]. User commands, the external
//! stop signal and ticker callbacks all arrive on the same channel, so a
//! stop and a completion can never interleave for one session.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;

use super::engine::{
    default_display_cadence, default_frame_cadence, EngineSnapshot, FocusEngine,
};
use super::session::FocusRequest;
use super::ticker::{Cadence, TickKind, TokioTicker};
use crate::clock::Clock;
use crate::error::{CoreError, FocusError, ServiceError};
use crate::events::{Event, EventSink};
use crate::ledger::ProgressLedger;

const COMMAND_CAPACITY: usize = 64;

/// Everything needed to build the engine inside the service.
pub struct EngineParts {
    pub clock: Arc<dyn Clock>,
    pub ledger: Arc<dyn ProgressLedger>,
    pub sinks: Vec<Box<dyn EventSink>>,
    pub display_cadence: Cadence,
    pub frame_cadence: Cadence,
}

impl EngineParts {
    pub fn new(clock: Arc<dyn Clock>, ledger: Arc<dyn ProgressLedger>) -> Self {
        Self {
            clock,
            ledger,
            sinks: Vec::new(),
            display_cadence: default_display_cadence(),
            frame_cadence: default_frame_cadence(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_cadences(mut self, display: Cadence, frame: Cadence) -> Self {
        self.display_cadence = display;
        self.frame_cadence = frame;
        self
    }
}

enum Command {
    Start {
        request: FocusRequest,
        reply: oneshot::Sender<Result<Event, FocusError>>,
    },
    Stop {
        reply: Option<oneshot::Sender<Option<Event>>>,
    },
    TogglePlayPause {
        reply: oneshot::Sender<Option<Event>>,
    },
    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },
    Tick(TickKind),
}

pub struct FocusService;

impl FocusService {
    /// Spawn the service on the current tokio runtime.
    ///
    /// The service runs until every [`FocusHandle`] and [`StopSignal`] is
    /// dropped; a session still running at that point is stopped.
    pub fn spawn(parts: EngineParts) -> Result<FocusHandle, ServiceError> {
        let runtime = Handle::try_current().map_err(|e| ServiceError::NoRuntime(e.to_string()))?;
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);

        let weak = tx.downgrade();
        let ticker = TokioTicker::new(runtime.clone(), move |kind| {
            let Some(tx) = weak.upgrade() else {
                return false;
            };
            match tx.try_send(Command::Tick(kind)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(?kind, "command queue full, tick dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });

        let mut engine = FocusEngine::new(parts.clock, parts.ledger, Box::new(ticker))
            .with_cadences(parts.display_cadence, parts.frame_cadence);
        for sink in parts.sinks {
            engine.subscribe(sink);
        }

        runtime.spawn(run(engine, rx));
        Ok(FocusHandle { tx })
    }
}

async fn run(mut engine: FocusEngine, mut rx: mpsc::Receiver<Command>) {
    tracing::debug!("focus service started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Start { request, reply } => {
                let _ = reply.send(engine.start(request));
            }
            Command::Stop { reply } => {
                let event = engine.stop();
                if let Some(reply) = reply {
                    let _ = reply.send(event);
                }
            }
            Command::TogglePlayPause { reply } => {
                let _ = reply.send(engine.toggle_play_pause());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
            Command::Tick(kind) => {
                engine.on_tick(kind);
            }
        }
    }
    engine.stop();
    tracing::debug!("focus service stopped");
}

/// Cloneable handle to a running [`FocusService`].
#[derive(Clone)]
pub struct FocusHandle {
    tx: mpsc::Sender<Command>,
}

impl FocusHandle {
    pub async fn start(&self, request: FocusRequest) -> Result<Event, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { request, reply }).await?;
        let result = rx.await.map_err(|_| ServiceError::Closed)?;
        Ok(result?)
    }

    /// Stop the running session. `Ok(None)` when nothing was running.
    pub async fn stop(&self) -> Result<Option<Event>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply: Some(reply) }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn toggle_play_pause(&self) -> Result<Option<Event>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::TogglePlayPause { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Out-of-band stop channel for surfaces outside the main app.
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            tx: self.tx.clone(),
        }
    }

    async fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).await.map_err(|_| ServiceError::Closed)
    }
}

/// External stop trigger. Produces exactly the same transition as
/// [`FocusHandle::stop`].
#[derive(Clone)]
pub struct StopSignal {
    tx: mpsc::Sender<Command>,
}

impl StopSignal {
    /// Queue a stop without waiting for its outcome.
    pub async fn trigger(&self) -> Result<(), ServiceError> {
        tracing::info!("external stop requested");
        self.tx
            .send(Command::Stop { reply: None })
            .await
            .map_err(|_| ServiceError::Closed)
    }
}
