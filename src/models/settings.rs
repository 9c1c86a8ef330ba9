// file: src/models/settings.rs
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User preferences persisted as key/value rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub volume: f32, // 0.0 to 1.0
    pub muted: bool,
    pub snooze_minutes: i64,
    pub burst_interval_ms: u64,
    pub burst_duration_ms: u64,
    pub vibration_period_ms: u64,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: 0.7, // 70% volume by default
            muted: false,
            snooze_minutes: 5,
            burst_interval_ms: 1000,
            burst_duration_ms: 800,
            vibration_period_ms: 3000,
            theme: "dark".to_string(),
        }
    }
}

impl Settings {
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }

    pub fn burst_duration(&self) -> Duration {
        Duration::from_millis(self.burst_duration_ms)
    }

    pub fn vibration_period(&self) -> Duration {
        Duration::from_millis(self.vibration_period_ms)
    }

    pub fn snooze_offset(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.snooze_minutes)
    }
}
