//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reward policy (coins per focused minute)
//! - Tick cadences for the countdown and the pet animation
//! - Named timer presets
//! - Event delivery queue sizing
//!
//! Configuration is stored at `~/.config/pawmodoro/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::ledger::RewardPolicy;
use crate::timer::Cadence;

/// Reward configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    #[serde(default = "default_coins_per_minute")]
    pub coins_per_minute: u64,
}

/// Tick cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Countdown refresh period.
    #[serde(default = "default_display_interval_ms")]
    pub display_interval_ms: u64,
    /// Animation frame period during the opening burst.
    #[serde(default = "default_frame_burst_interval_ms")]
    pub frame_burst_interval_ms: u64,
    /// Length of the opening burst.
    #[serde(default = "default_frame_burst_window_secs")]
    pub frame_burst_window_secs: u64,
    /// Animation frame period after the burst.
    #[serde(default = "default_frame_steady_interval_secs")]
    pub frame_steady_interval_secs: u64,
}

/// Event delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the bounded queue feeding a presentation sink.
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

/// Longest timer a preset may hold.
pub const MAX_PRESET_SECS: u64 = 24 * 3600;

/// A named timer the user can start by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    /// Short description shown next to the name.
    #[serde(default)]
    pub desc: String,
    /// `#RRGGBB` accent color, empty for the default.
    #[serde(default)]
    pub color: String,
    pub icon: String,
    pub duration_secs: u64,
}

impl Preset {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            name: name.into(),
            desc: String::new(),
            color: String::new(),
            icon: icon.into(),
            duration_secs,
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

fn is_hex_color(raw: &str) -> bool {
    raw.strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pawmodoro/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub ticks: TickConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default = "default_presets")]
    pub presets: Vec<Preset>,
}

// Default functions
fn default_coins_per_minute() -> u64 {
    10
}
fn default_display_interval_ms() -> u64 {
    1000
}
fn default_frame_burst_interval_ms() -> u64 {
    500
}
fn default_frame_burst_window_secs() -> u64 {
    30
}
fn default_frame_steady_interval_secs() -> u64 {
    5
}
fn default_sink_capacity() -> usize {
    64
}
fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new("Pomodoro", "🍅", 1500),
        Preset::new("Short Break", "🌿", 300),
        Preset::new("Long Break", "🛋️", 900),
        Preset::new("Coffee", "☕️", 300),
        Preset::new("Work", "💼", 1500),
        Preset::new("Nap", "🛏️", 1200),
        Preset::new("Sport", "⚽️", 3600),
    ]
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            coins_per_minute: default_coins_per_minute(),
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            display_interval_ms: default_display_interval_ms(),
            frame_burst_interval_ms: default_frame_burst_interval_ms(),
            frame_burst_window_secs: default_frame_burst_window_secs(),
            frame_steady_interval_secs: default_frame_steady_interval_secs(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            sink_capacity: default_sink_capacity(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reward: RewardConfig::default(),
            ticks: TickConfig::default(),
            events: EventsConfig::default(),
            presets: default_presets(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("falling back to default configuration: {e}");
            Self::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The caller persists with
    /// [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is unusable.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let zero = |key: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        };
        if self.ticks.display_interval_ms == 0 {
            return Err(zero("ticks.display_interval_ms"));
        }
        if self.ticks.frame_burst_interval_ms == 0 {
            return Err(zero("ticks.frame_burst_interval_ms"));
        }
        if self.ticks.frame_steady_interval_secs == 0 {
            return Err(zero("ticks.frame_steady_interval_secs"));
        }
        if self.events.sink_capacity == 0 {
            return Err(zero("events.sink_capacity"));
        }
        if let Some(p) = self.presets.iter().find(|p| p.duration_secs == 0) {
            return Err(ConfigError::InvalidValue {
                key: "presets".into(),
                message: format!("preset '{}' has a zero duration", p.name),
            });
        }
        Ok(())
    }

    /// Look up a preset by name (case-insensitive).
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Add a user-defined timer. The caller persists with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for an empty or taken name, a duration outside
    /// `1..=MAX_PRESET_SECS`, or a color that is not `#RRGGBB`.
    pub fn add_preset(&mut self, mut preset: Preset) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "presets".into(),
            message,
        };

        preset.name = preset.name.trim().to_string();
        if preset.name.is_empty() {
            return Err(invalid("preset name must not be empty".into()));
        }
        if self.preset(&preset.name).is_some() {
            return Err(invalid(format!("a preset named '{}' already exists", preset.name)));
        }
        if preset.duration_secs == 0 || preset.duration_secs > MAX_PRESET_SECS {
            return Err(invalid(format!(
                "duration must be between 1 and {MAX_PRESET_SECS} seconds, got {}",
                preset.duration_secs
            )));
        }
        if !preset.color.is_empty() && !is_hex_color(&preset.color) {
            return Err(invalid(format!("color '{}' is not #RRGGBB", preset.color)));
        }

        tracing::info!(name = %preset.name, duration_secs = preset.duration_secs, "preset added");
        self.presets.push(preset);
        Ok(())
    }

    /// Remove a preset by name (case-insensitive). The caller persists with
    /// [`Config::save`].
    pub fn remove_preset(&mut self, name: &str) -> Result<Preset, ConfigError> {
        let index = self
            .presets
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;
        Ok(self.presets.remove(index))
    }

    pub fn reward_policy(&self) -> RewardPolicy {
        RewardPolicy::new(self.reward.coins_per_minute)
    }

    pub fn display_cadence(&self) -> Cadence {
        Cadence::Every(Duration::from_millis(self.ticks.display_interval_ms))
    }

    pub fn frame_cadence(&self) -> Cadence {
        Cadence::Burst {
            fast: Duration::from_millis(self.ticks.frame_burst_interval_ms),
            window: Duration::from_secs(self.ticks.frame_burst_window_secs),
            slow: Duration::from_secs(self.ticks.frame_steady_interval_secs),
        }
    }
}
