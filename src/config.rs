use serde::{Deserialize, Serialize};
use std::time::Duration;

/// engine configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// master switch; when false the engine does not tick at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// pause between ticks
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: u64,
    /// send a reminder when the due date is at most this many days away
    #[serde(default = "default_reminder_window_days")]
    pub reminder_window_days: i64,
    /// send a dunning notice once the due date is at least this many days past
    #[serde(default = "default_dunning_threshold_days")]
    pub dunning_threshold_days: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_tick_interval_seconds() -> u64 {
    300
}

fn default_reminder_window_days() -> i64 {
    3
}

fn default_dunning_threshold_days() -> i64 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tick_interval_seconds: default_tick_interval_seconds(),
            reminder_window_days: default_reminder_window_days(),
            dunning_threshold_days: default_dunning_threshold_days(),
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }
}
