use crate::error::{AppError, AppResult};
use crate::models::{Ringtone, Settings};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rodio::{OutputStream, Sink};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod tone;

pub use tone::ToneBurst;

/// Where synthesized bursts end up.
#[cfg_attr(test, mockall::automock)]
pub trait ToneOutput: Send + Sync {
    fn play(&self, burst: ToneBurst) -> Result<()>;
}

/// Plays bursts on the default output device through rodio.
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioOutput;

impl RodioOutput {
    /// Checks that a default output device can be opened.
    pub fn probe() -> Result<Self> {
        let (_stream, _handle) =
            OutputStream::try_default().context("Failed to create audio output stream")?;
        Ok(Self)
    }

    fn play_blocking(burst: ToneBurst) -> Result<()> {
        // Create output stream on each call (OutputStream is not Send + Sync)
        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to create audio output stream")?;

        let sink = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;
        sink.append(burst);
        sink.sleep_until_end();

        // Keep stream alive until the burst finishes
        drop(stream);
        Ok(())
    }
}

impl ToneOutput for RodioOutput {
    // A burst already handed to the device plays out its short duration even
    // if the session ends meanwhile; no new burst starts after teardown.
    fn play(&self, burst: ToneBurst) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .context("Audio playback needs a tokio runtime")?;
        handle.spawn_blocking(move || {
            if let Err(e) = Self::play_blocking(burst) {
                error!("Failed to play alarm burst: {:#}", e);
            }
        });
        Ok(())
    }
}

/// Output used when no audio device is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentOutput;

impl ToneOutput for SilentOutput {
    fn play(&self, burst: ToneBurst) -> Result<()> {
        debug!("Silent output dropping {:.0} Hz burst", burst.frequency());
        Ok(())
    }
}

/// Volume/mute state and burst emission shared by every session.
///
/// Sessions read the volume when a burst is built, so changes made while an
/// alarm announces apply from the next burst on.
#[derive(Clone)]
pub struct AudioManager {
    volume: Arc<Mutex<f32>>,
    muted: Arc<Mutex<bool>>,
    burst_duration: Duration,
    output: Arc<dyn ToneOutput>,
}

impl AudioManager {
    pub fn new(output: Arc<dyn ToneOutput>, settings: &Settings) -> Self {
        info!("Initializing audio system");
        Self {
            volume: Arc::new(Mutex::new(settings.volume.clamp(0.0, 1.0))),
            muted: Arc::new(Mutex::new(settings.muted)),
            burst_duration: settings.burst_duration(),
            output,
        }
    }

    /// Audio on the default device, or a silent manager if none can be opened.
    pub fn with_default_device(settings: &Settings) -> Self {
        match RodioOutput::probe() {
            Ok(output) => Self::new(Arc::new(output), settings),
            Err(e) => {
                warn!("Audio unavailable ({:#}), alarms will be silent", e);
                Self::new_dummy(settings)
            }
        }
    }

    /// Create a dummy audio manager that does nothing
    pub fn new_dummy(settings: &Settings) -> Self {
        warn!("Using dummy audio manager - audio features will be disabled");
        Self::new(Arc::new(SilentOutput), settings)
    }

    /// Sets the volume, clamped to 0.0..=1.0. Non-finite values are ignored.
    pub fn set_volume(&self, volume: f32) -> f32 {
        if !volume.is_finite() {
            warn!("Ignoring volume {}", volume);
            return self.get_volume();
        }
        let vol = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap_or_else(|e| e.into_inner()) = vol;
        info!("Set alarm volume to {:.0}%", vol * 100.0);
        vol
    }

    pub fn get_volume(&self) -> f32 {
        *self.volume.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_muted(&self, muted: bool) {
        *self.muted.lock().unwrap_or_else(|e| e.into_inner()) = muted;
        info!("Sound {}", if muted { "muted" } else { "unmuted" });
    }

    /// Flips the mute flag and returns the new state.
    pub fn toggle_mute(&self) -> bool {
        let mut muted = self.muted.lock().unwrap_or_else(|e| e.into_inner());
        *muted = !*muted;
        info!("Sound {}", if *muted { "muted" } else { "unmuted" });
        *muted
    }

    pub fn is_muted(&self) -> bool {
        *self.muted.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Volume the next burst will use.
    pub fn effective_volume(&self) -> f32 {
        if self.is_muted() {
            0.0
        } else {
            self.get_volume()
        }
    }

    /// Emits one burst of `ringtone` at the current volume.
    pub fn play_burst(&self, ringtone: &Ringtone) -> AppResult<()> {
        let burst = ToneBurst::new(ringtone, self.effective_volume(), self.burst_duration);
        debug!(
            "Burst {} at {:.0} Hz, peak {:.2}",
            ringtone.name,
            burst.frequency(),
            burst.peak()
        );
        self.output
            .play(burst)
            .map_err(|e| AppError::audio(format!("Burst playback failed: {:#}", e)))
    }

    pub fn test_audio(&self) -> AppResult<()> {
        info!("Testing audio system");
        self.play_burst(Ringtone::default_ringtone())
    }
}
