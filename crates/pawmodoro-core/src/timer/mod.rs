mod engine;
mod format;
mod service;
mod session;
mod ticker;

pub use engine::{
    default_display_cadence, default_frame_cadence, EngineSnapshot, FocusEngine, Phase,
    FRAME_COUNT,
};
pub use format::{format_duration_label, format_remaining};
pub use service::{EngineParts, FocusHandle, FocusService, StopSignal};
pub use session::{FocusRequest, Session};
pub use ticker::{Cadence, Emitter, ManualTicker, TickKind, Ticker, TokioTicker};
