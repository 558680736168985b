//! Focus session value types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FocusError;
use crate::ledger::PetId;

/// What the caller asks for when starting a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRequest {
    pub name: String,
    pub icon: String,
    /// Signed so that bad input can be reported rather than wrapped.
    pub duration_secs: i64,
    /// Companion pet. `None` means "use the active pet".
    #[serde(default)]
    pub pet: Option<PetId>,
}

impl FocusRequest {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            duration_secs,
            pet: None,
        }
    }

    pub fn with_pet(mut self, pet: PetId) -> Self {
        self.pet = Some(pet);
        self
    }

    pub(crate) fn validated_duration(&self) -> Result<u64, FocusError> {
        u64::try_from(self.duration_secs)
            .ok()
            .filter(|&secs| secs > 0)
            .ok_or(FocusError::InvalidDuration(self.duration_secs))
    }
}

/// One running focus session. Its timing never changes once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    name: String,
    icon: String,
    total_duration_secs: u64,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    pet: Option<PetId>,
}

impl Session {
    /// Fails with `InvalidDuration` when the end time is not representable.
    pub(crate) fn begin(
        name: String,
        icon: String,
        total_duration_secs: u64,
        started_at: DateTime<Utc>,
        pet: Option<PetId>,
    ) -> Result<Self, FocusError> {
        let secs = i64::try_from(total_duration_secs).unwrap_or(i64::MAX);
        let ends_at = Duration::try_seconds(secs)
            .and_then(|span| started_at.checked_add_signed(span))
            .ok_or(FocusError::InvalidDuration(secs))?;
        Ok(Self {
            name,
            icon,
            total_duration_secs,
            started_at,
            ends_at,
            pet,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn total_duration_secs(&self) -> u64 {
        self.total_duration_secs
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn pet(&self) -> Option<&PetId> {
        self.pet.as_ref()
    }

    /// Seconds until `ends_at`; negative once overrun.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> f64 {
        secs_between(now, self.ends_at)
    }

    /// Seconds since `started_at`; may exceed the nominal duration.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        secs_between(self.started_at, now)
    }

    /// `clamp((total - remaining) / total, 0, 1)`.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        let total = self.total_duration_secs as f64;
        let elapsed = total - self.remaining_secs(now);
        (elapsed / total).clamp(0.0, 1.0)
    }
}

fn secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
