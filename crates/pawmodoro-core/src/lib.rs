//! # Pawmodoro Core Library
//!
//! This library provides the core business logic for Pawmodoro, a focus
//! timer that rewards finished sessions with coins to spend on virtual pets.
//! Frontends (the CLI, a live countdown surface) are thin layers over the
//! same engine and ledger.
//!
//! ## Architecture
//!
//! - **Focus Engine**: A wall-clock-based state machine. Ticks come from a
//!   cancellable [`Ticker`]; the [`FocusService`] actor serializes ticks and
//!   user commands onto one task
//! - **Ledger**: Converts completed sessions into coins, streaks and history
//!   and runs the pet shop
//! - **Storage**: In-memory and SQLite progress stores, TOML configuration
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: Core session state machine
//! - [`FocusService`] / [`FocusHandle`]: Async single-owner wrapper
//! - [`ProgressLedger`] / [`Ledger`]: Reward accounting
//! - [`ProgressStore`]: Persistence seam ([`MemoryStore`], [`SqliteStore`])
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    ConfigError, CoreError, DatabaseError, FocusError, LedgerError, ServiceError,
};
pub use events::{ChannelSink, Event, EventSink, SinkError};
pub use ledger::{
    Catalog, Ledger, LedgerRecord, PetEntry, PetId, ProgressLedger, PurchaseOutcome,
    RewardPolicy, Stats, UserProgress,
};
pub use storage::{Config, MemoryStore, Preset, ProgressStore, SqliteStore};
pub use timer::{
    Cadence, EngineParts, EngineSnapshot, FocusEngine, FocusHandle, FocusRequest, FocusService,
    ManualTicker, Phase, Session, StopSignal, TickKind, Ticker, TokioTicker,
};
