// file: src/models/alert.rs
use super::alarm::{Alarm, AlarmId};
use chrono::NaiveDateTime;
use serde::Serialize;

/// What the presentation layer receives when a session starts announcing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireNotice {
    pub alarm_id: AlarmId,
    pub label: String,
    pub time: String,
    pub ringtone: String,
    pub vibrate: bool,
    pub repeat: String,
    pub fired_at: NaiveDateTime,
    pub from_snooze: bool,
}

impl FireNotice {
    pub fn new(alarm: &Alarm, fired_at: NaiveDateTime, from_snooze: bool) -> Self {
        Self {
            alarm_id: alarm.id,
            label: alarm.label.clone(),
            time: alarm.time_label(),
            ringtone: alarm.ringtone().name.to_string(),
            vibrate: alarm.vibrate,
            repeat: alarm.repeat.description(),
            fired_at,
            from_snooze,
        }
    }
}

/// How an announcing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionOutcome {
    Dismissed,
    Snoozed,
    /// Replaced by a direct fire of a different alarm.
    Superseded,
    /// The alarm was deleted while it was announcing.
    Removed,
    Shutdown,
}

/// The single "currently firing" slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Announcing(AlarmId),
}

impl SessionState {
    pub fn is_announcing(&self, id: AlarmId) -> bool {
        matches!(self, SessionState::Announcing(active) if *active == id)
    }
}
