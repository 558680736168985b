use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ledger::PetId;

/// Every state change of the focus engine produces an Event.
/// Presentation layers (a live countdown surface, the CLI) subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        name: String,
        icon: String,
        total_duration_secs: u64,
        /// Static label such as "25 min".
        duration_label: String,
        /// Absolute end time, so a surface can count down on its own.
        ends_at: DateTime<Utc>,
        pet: Option<PetId>,
        at: DateTime<Utc>,
    },
    Tick {
        remaining_secs: f64,
        remaining_formatted: String,
        progress: f64,
        at: DateTime<Utc>,
    },
    /// The pet animation moved to the next frame (0..4).
    FrameAdvanced {
        frame: u8,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        name: String,
        actual_duration_secs: f64,
        /// Absent when the ledger failed to record the reward.
        coins_earned: Option<u64>,
        at: DateTime<Utc>,
    },
    /// Session cancelled before its end; no reward.
    SessionStopped {
        name: String,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the events that close a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SessionCompleted { .. } | Event::SessionStopped { .. }
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink queue is full, event dropped")]
    Full,
    #[error("sink receiver is gone")]
    Closed,
}

/// A presentation collaborator. Delivery must not block; the engine logs
/// failures and carries on.
pub trait EventSink: Send {
    fn deliver(&self, event: &Event) -> Result<(), SinkError>;
}

/// Sink feeding a bounded tokio channel. Drops events when the queue is full.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}
