// file: src/models/ringtone.rs
use serde::Serialize;

/// Tone family of a ringtone. Decides the oscillator shape of each burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Beep,
    Chime,
    Digital,
    Nature,
    Bell,
}

/// Oscillator used to synthesize a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oscillator {
    Sine,
    Square,
}

impl Waveform {
    pub fn oscillator(self) -> Oscillator {
        match self {
            Waveform::Digital => Oscillator::Square,
            Waveform::Beep | Waveform::Chime | Waveform::Nature | Waveform::Bell => {
                Oscillator::Sine
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ringtone {
    pub name: &'static str,
    pub frequency: f32,
    pub waveform: Waveform,
    /// Envelope pattern in seconds. Cosmetic only, playback timing ignores it.
    pub pattern: &'static [f32],
}

pub static RINGTONES: [Ringtone; 5] = [
    Ringtone {
        name: "Energetic Beep",
        frequency: 800.0,
        waveform: Waveform::Beep,
        pattern: &[0.2, 0.1, 0.2, 0.1, 0.5],
    },
    Ringtone {
        name: "Gentle Chime",
        frequency: 440.0,
        waveform: Waveform::Chime,
        pattern: &[0.3, 0.2, 0.3, 0.2, 0.4],
    },
    Ringtone {
        name: "Digital Alert",
        frequency: 1000.0,
        waveform: Waveform::Digital,
        pattern: &[0.1, 0.05, 0.1, 0.05, 0.1, 0.05, 0.3],
    },
    Ringtone {
        name: "Nature Sounds",
        frequency: 300.0,
        waveform: Waveform::Nature,
        pattern: &[0.5, 0.3, 0.5, 0.3, 0.6],
    },
    Ringtone {
        name: "Classic Bell",
        frequency: 600.0,
        waveform: Waveform::Bell,
        pattern: &[0.4, 0.2, 0.4, 0.2, 0.5],
    },
];

impl Ringtone {
    pub fn catalog() -> &'static [Ringtone] {
        &RINGTONES
    }

    pub fn default_ringtone() -> &'static Ringtone {
        &RINGTONES[0]
    }

    /// Looks a ringtone up by name, falling back to the first catalog entry.
    pub fn lookup(name: &str) -> &'static Ringtone {
        RINGTONES
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(Self::default_ringtone)
    }

    pub fn exists(name: &str) -> bool {
        RINGTONES.iter().any(|r| r.name == name)
    }
}
