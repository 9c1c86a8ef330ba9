// Declare modules
pub mod alarm;
pub mod alert;
pub mod ringtone;
pub mod settings;

// Flatten so `use crate::models::Alarm` works.
pub use alarm::{sample_alarms, Alarm, AlarmDraft, AlarmId, RepeatDays};
pub use alert::{FireNotice, SessionOutcome, SessionState};
pub use ringtone::{Oscillator, Ringtone, Waveform};
pub use settings::Settings;
