//! Synthesis of a single alarm burst.
//!
//! A burst is a short oscillator note pushed through a one-pole low-pass at
//! twice the base frequency. Gain ramps linearly from silence to its peak over
//! the attack, then back to silence at the end of the burst so consecutive
//! bursts never click.

use crate::models::{Oscillator, Ringtone};
use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44_100;
pub const ATTACK: Duration = Duration::from_millis(100);
/// Fraction of the user volume used as burst peak.
pub const PEAK_GAIN: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ToneBurst {
    frequency: f32,
    oscillator: Oscillator,
    peak: f32,
    total_samples: u64,
    attack_samples: u64,
    index: u64,
    alpha: f32,
    filtered: f32,
}

impl ToneBurst {
    pub fn new(ringtone: &Ringtone, volume: f32, duration: Duration) -> Self {
        let total_samples = samples_for(duration).max(1);
        let attack_samples = samples_for(ATTACK).min(total_samples);

        let cutoff = ringtone.frequency * 2.0;
        let rc = 1.0 / (2.0 * PI * cutoff);
        let dt = 1.0 / SAMPLE_RATE as f32;

        Self {
            frequency: ringtone.frequency,
            oscillator: ringtone.waveform.oscillator(),
            peak: volume.clamp(0.0, 1.0) * PEAK_GAIN,
            total_samples,
            attack_samples,
            index: 0,
            alpha: dt / (rc + dt),
            filtered: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn oscillator(&self) -> Oscillator {
        self.oscillator
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn is_silent(&self) -> bool {
        self.peak <= 0.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.total_samples as f64 / f64::from(SAMPLE_RATE))
    }

    /// Gain at sample `index`.
    pub fn envelope(&self, index: u64) -> f32 {
        if index >= self.total_samples {
            return 0.0;
        }
        if index < self.attack_samples {
            return self.peak * index as f32 / self.attack_samples as f32;
        }
        let release = self.total_samples - self.attack_samples;
        if release == 0 {
            return 0.0;
        }
        let remaining = self.total_samples - index;
        self.peak * remaining as f32 / release as f32
    }

    fn raw_sample(&self, index: u64) -> f32 {
        let t = index as f32 / SAMPLE_RATE as f32;
        let phase = (self.frequency * t).fract();
        match self.oscillator {
            Oscillator::Sine => (2.0 * PI * phase).sin(),
            Oscillator::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

fn samples_for(duration: Duration) -> u64 {
    (duration.as_secs_f64() * f64::from(SAMPLE_RATE)).round() as u64
}

impl Iterator for ToneBurst {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total_samples {
            return None;
        }
        let raw = self.raw_sample(self.index);
        self.filtered += self.alpha * (raw - self.filtered);
        let sample = self.filtered * self.envelope(self.index);
        self.index += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total_samples - self.index) as usize;
        (left, Some(left))
    }
}

impl Source for ToneBurst {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total_samples - self.index) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration())
    }
}
