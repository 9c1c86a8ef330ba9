//! Haptic and visual feedback ports.
//!
//! Both are best-effort: a host without the capability uses the no-op
//! implementations and alarms still fire.

use crate::error::AppResult;
use log::debug;
use std::time::Duration;

/// Pulse/pause pattern played on every haptic re-arm.
pub const VIBRATION_PATTERN: [Duration; 5] = [
    Duration::from_millis(1000),
    Duration::from_millis(500),
    Duration::from_millis(1000),
    Duration::from_millis(500),
    Duration::from_millis(1000),
];

#[cfg_attr(test, mockall::automock)]
pub trait Haptics: Send + Sync {
    /// Starts one pulse/pause pattern. Alternating entries are on, off.
    fn vibrate(&self, pattern: &[Duration]) -> AppResult<()>;

    /// Stops any pattern still running on the device.
    fn stop(&self) {}
}

/// Host without a vibration motor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn vibrate(&self, pattern: &[Duration]) -> AppResult<()> {
        debug!("No haptic device, skipping {} step pattern", pattern.len());
        Ok(())
    }
}

/// Receives the animated level bars shown while an alarm announces.
#[cfg_attr(test, mockall::automock)]
pub trait Visualizer: Send + Sync {
    fn draw(&self, levels: &[f32]);
    fn clear(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoVisualizer;

impl Visualizer for NoVisualizer {
    fn draw(&self, _levels: &[f32]) {}
    fn clear(&self) {}
}

pub const BAR_COUNT: usize = 20;

/// Bar heights (0.0 to 0.8) for animation frame `frame`.
pub fn bar_levels(frame: u64) -> [f32; BAR_COUNT] {
    let mut levels = [0.0; BAR_COUNT];
    for (i, level) in levels.iter_mut().enumerate() {
        let phase = frame as f32 * 0.35 + i as f32 * 0.9;
        *level = 0.4 + 0.4 * phase.sin() * (phase * 0.37).cos();
    }
    levels
}
