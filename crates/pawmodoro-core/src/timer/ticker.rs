//! Periodic tick scheduling.
//!
//! A [`Ticker`] runs up to one repeating schedule per [`TickKind`]. Arming a
//! kind that is already armed replaces its schedule; disarming cancels it.
//! [`TokioTicker`] backs each schedule with a tokio task, [`ManualTicker`]
//! only records what was asked so engine tests can run without a runtime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::error::ServiceError;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickKind {
    /// Countdown and progress refresh.
    Display,
    /// Pet animation frame.
    Frame,
}

impl TickKind {
    pub const ALL: [TickKind; 2] = [TickKind::Display, TickKind::Frame];
}

/// How often a tick fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Every(Duration),
    /// `fast` until `window` has elapsed since arming, then `slow`.
    Burst {
        fast: Duration,
        window: Duration,
        slow: Duration,
    },
}

impl Cadence {
    /// Period of the next firing, given time elapsed since arming.
    pub fn period_at(&self, elapsed: Duration) -> Duration {
        let period = match *self {
            Cadence::Every(period) => period,
            Cadence::Burst { fast, window, slow } => {
                if elapsed < window {
                    fast
                } else {
                    slow
                }
            }
        };
        period.max(MIN_PERIOD)
    }
}

pub trait Ticker: Send {
    fn arm(&mut self, kind: TickKind, cadence: Cadence);

    fn disarm(&mut self, kind: TickKind);

    fn is_armed(&self, kind: TickKind) -> bool;

    fn disarm_all(&mut self) {
        for kind in TickKind::ALL {
            self.disarm(kind);
        }
    }
}

/// Callback invoked on every firing. Returning `false` ends that schedule.
pub type Emitter = Arc<dyn Fn(TickKind) -> bool + Send + Sync>;

/// Ticker running each schedule as a tokio task.
pub struct TokioTicker {
    runtime: Handle,
    emit: Emitter,
    tasks: HashMap<TickKind, JoinHandle<()>>,
}

impl TokioTicker {
    pub fn new<F>(runtime: Handle, emit: F) -> Self
    where
        F: Fn(TickKind) -> bool + Send + Sync + 'static,
    {
        Self {
            runtime,
            emit: Arc::new(emit),
            tasks: HashMap::new(),
        }
    }

    /// Build on the runtime the caller is running in.
    pub fn on_current_runtime<F>(emit: F) -> Result<Self, ServiceError>
    where
        F: Fn(TickKind) -> bool + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| ServiceError::NoRuntime(e.to_string()))?;
        Ok(Self::new(runtime, emit))
    }
}

impl Ticker for TokioTicker {
    fn arm(&mut self, kind: TickKind, cadence: Cadence) {
        self.disarm(kind);
        let emit = Arc::clone(&self.emit);
        let task = self.runtime.spawn(run_schedule(kind, cadence, emit));
        self.tasks.insert(kind, task);
        tracing::debug!(?kind, ?cadence, "tick schedule armed");
    }

    fn disarm(&mut self, kind: TickKind) {
        if let Some(task) = self.tasks.remove(&kind) {
            task.abort();
            tracing::debug!(?kind, "tick schedule disarmed");
        }
    }

    fn is_armed(&self, kind: TickKind) -> bool {
        self.tasks.get(&kind).is_some_and(|task| !task.is_finished())
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

async fn run_schedule(kind: TickKind, cadence: Cadence, emit: Emitter) {
    let armed_at = Instant::now();
    let mut next = armed_at;
    loop {
        let period = cadence.period_at(next.duration_since(armed_at));
        next += period;
        let now = Instant::now();
        if next < now {
            // Fell behind; skip the missed firings.
            next = now + period;
        }
        sleep_until(next).await;
        if !emit(kind) {
            tracing::debug!(?kind, "tick receiver gone, schedule ended");
            break;
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    armed: HashMap<TickKind, Cadence>,
    arm_calls: HashMap<TickKind, usize>,
}

/// Ticker that never fires on its own. Clones share state, so a test can
/// hand one to the engine and inspect it through another.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cadence the kind is currently armed with.
    pub fn cadence(&self, kind: TickKind) -> Option<Cadence> {
        self.lock().armed.get(&kind).copied()
    }

    /// How many times the kind has been armed.
    pub fn arm_calls(&self, kind: TickKind) -> usize {
        self.lock().arm_calls.get(&kind).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Ticker for ManualTicker {
    fn arm(&mut self, kind: TickKind, cadence: Cadence) {
        let mut state = self.lock();
        state.armed.insert(kind, cadence);
        *state.arm_calls.entry(kind).or_default() += 1;
    }

    fn disarm(&mut self, kind: TickKind) {
        self.lock().armed.remove(&kind);
    }

    fn is_armed(&self, kind: TickKind) -> bool {
        self.lock().armed.contains_key(&kind)
    }
}
