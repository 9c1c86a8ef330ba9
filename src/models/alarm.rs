// file: src/models/alarm.rs
use super::ringtone::Ringtone;
use crate::error::{AppError, AppResult};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_LABEL: &str = "Alarm";

pub const WEEKDAY_SHORT: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];
pub const WEEKDAY_FULL: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub const ACCENT_PALETTE: [&str; 7] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FECA57", "#FF9FF3", "#54A0FF",
];

/// Stable identifier of an alarm. Zero means "not assigned yet".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AlarmId(pub u64);

impl AlarmId {
    pub const UNASSIGNED: AlarmId = AlarmId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accent colour for an alarm, rotating through the palette by id.
pub fn accent_for(id: AlarmId) -> &'static str {
    let index = id.0.saturating_sub(1) as usize % ACCENT_PALETTE.len();
    ACCENT_PALETTE[index]
}

/// Set of weekdays (Sunday = 0) an alarm repeats on. Empty means one-shot.
///
/// Stored as a bitmask so values are always in `0..=6` and deduplicated.
/// Serializes as an ascending list of day indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct RepeatDays(u8);

impl RepeatDays {
    pub const ONCE: RepeatDays = RepeatDays(0);
    pub const EVERY_DAY: RepeatDays = RepeatDays(0b0111_1111);
    pub const WEEKDAYS: RepeatDays = RepeatDays(0b0011_1110);
    pub const WEEKENDS: RepeatDays = RepeatDays(0b0100_0001);

    /// Builds a set from day indices, rejecting anything outside `0..=6`.
    pub fn from_days<I: IntoIterator<Item = u8>>(days: I) -> AppResult<Self> {
        let mut set = Self::ONCE;
        for day in days {
            if day > 6 {
                return Err(AppError::invalid_input(format!(
                    "weekday index {} is out of range 0-6",
                    day
                )));
            }
            set.0 |= 1 << day;
        }
        Ok(set)
    }

    /// Parses `once`, `daily`, `weekdays`, `weekends` or a comma list like
    /// `1,2,3` or `mon,wed`.
    pub fn parse(input: &str) -> AppResult<Self> {
        match input.trim().to_lowercase().as_str() {
            "" | "once" => Ok(Self::ONCE),
            "daily" | "everyday" => Ok(Self::EVERY_DAY),
            "weekdays" => Ok(Self::WEEKDAYS),
            "weekends" => Ok(Self::WEEKENDS),
            list => {
                let days = list
                    .split(',')
                    .map(|part| parse_day(part.trim()))
                    .collect::<AppResult<Vec<u8>>>()?;
                Self::from_days(days)
            }
        }
    }

    pub fn contains(self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn is_once(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.is_once()
    }

    pub fn days(self) -> impl Iterator<Item = u8> {
        (0..7u8).filter(move |day| self.contains(*day))
    }

    /// Human readable summary: "Once", "Every day" or short day letters.
    pub fn description(self) -> String {
        match self.len() {
            0 => "Once".to_string(),
            7 => "Every day".to_string(),
            _ => self
                .days()
                .map(|day| WEEKDAY_SHORT[day as usize])
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A day index, or a day name abbreviated to at least three letters.
fn parse_day(part: &str) -> AppResult<u8> {
    if let Ok(day) = part.parse::<u8>() {
        return Ok(day);
    }
    WEEKDAY_FULL
        .iter()
        .position(|name| part.len() >= 3 && name.to_lowercase().starts_with(part))
        .map(|day| day as u8)
        .ok_or_else(|| AppError::invalid_input(format!("'{}' is not a weekday", part)))
}

impl From<Vec<u8>> for RepeatDays {
    /// Lenient conversion for stored data: out-of-range entries are dropped.
    fn from(days: Vec<u8>) -> Self {
        let mut set = Self::ONCE;
        for day in days.into_iter().filter(|d| *d <= 6) {
            set.0 |= 1 << day;
        }
        set
    }
}

impl From<RepeatDays> for Vec<u8> {
    fn from(days: RepeatDays) -> Self {
        days.days().collect()
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parses a local wall-clock time of day written as `HH:MM`.
pub fn parse_time(input: &str) -> AppResult<NaiveTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("Please select a time for the alarm"));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| AppError::invalid_input(format!("'{}' is not a valid HH:MM time", trimmed)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub label: String,
    pub enabled: bool,
    pub repeat: RepeatDays,
    pub ringtone_id: String,
    pub vibrate: bool,
    pub color: String,
}

impl Alarm {
    pub fn ringtone(&self) -> &'static Ringtone {
        Ringtone::lookup(&self.ringtone_id)
    }

    pub fn is_one_shot(&self) -> bool {
        self.repeat.is_once()
    }

    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// True when the alarm is due in the minute `now` falls in.
    ///
    /// The day is taken from `now`, never from when the alarm was created.
    pub fn matches(&self, now: &NaiveDateTime) -> bool {
        if !self.enabled {
            return false;
        }
        if self.time.hour() != now.hour() || self.time.minute() != now.minute() {
            return false;
        }
        let today = now.weekday().num_days_from_sunday() as u8;
        self.repeat.is_once() || self.repeat.contains(today)
    }
}

/// Unvalidated alarm form contents collected by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlarmDraft {
    pub time: Option<NaiveTime>,
    pub label: String,
    pub repeat: RepeatDays,
    pub ringtone_id: String,
    pub vibrate: bool,
}

impl AlarmDraft {
    /// Fresh form prefilled with the next minute and the default ringtone.
    pub fn new_for(now: NaiveDateTime) -> Self {
        let next = now + Duration::minutes(1);
        Self {
            time: NaiveTime::from_hms_opt(next.hour(), next.minute(), 0),
            ringtone_id: Ringtone::default_ringtone().name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_alarm(alarm: &Alarm) -> Self {
        Self {
            time: Some(alarm.time),
            label: alarm.label.clone(),
            repeat: alarm.repeat,
            ringtone_id: alarm.ringtone_id.clone(),
            vibrate: alarm.vibrate,
        }
    }

    pub fn with_time(mut self, input: &str) -> AppResult<Self> {
        self.time = Some(parse_time(input)?);
        Ok(self)
    }

    /// Validates the form and turns it into an enabled alarm record.
    ///
    /// The id and colour are left for the store to fill in when unassigned.
    pub fn into_alarm(self, id: AlarmId) -> AppResult<Alarm> {
        let time = self
            .time
            .ok_or_else(|| AppError::invalid_input("Please select a time for the alarm"))?;
        // seconds are never matched, keep the record on the minute
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);

        let label = match self.label.trim() {
            "" => DEFAULT_LABEL.to_string(),
            other => other.to_string(),
        };
        let ringtone_id = if self.ringtone_id.trim().is_empty() {
            Ringtone::default_ringtone().name.to_string()
        } else {
            self.ringtone_id
        };

        Ok(Alarm {
            id,
            time,
            label,
            enabled: true,
            repeat: self.repeat,
            ringtone_id,
            vibrate: self.vibrate,
            color: String::new(),
        })
    }
}

/// The starter alarms written to a freshly created database.
pub fn sample_alarms() -> Vec<Alarm> {
    let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
    vec![
        Alarm {
            id: AlarmId(1),
            time: at(7, 0),
            label: "Morning Workout".to_string(),
            enabled: true,
            repeat: RepeatDays::WEEKDAYS,
            ringtone_id: "Energetic Beep".to_string(),
            vibrate: true,
            color: "#FF6B6B".to_string(),
        },
        Alarm {
            id: AlarmId(2),
            time: at(12, 30),
            label: "Lunch Break".to_string(),
            enabled: false,
            repeat: RepeatDays::ONCE,
            ringtone_id: "Gentle Chime".to_string(),
            vibrate: false,
            color: "#4ECDC4".to_string(),
        },
        Alarm {
            id: AlarmId(3),
            time: at(18, 0),
            label: "Evening Walk".to_string(),
            enabled: true,
            repeat: RepeatDays::WEEKENDS,
            ringtone_id: "Nature Sounds".to_string(),
            vibrate: true,
            color: "#45B7D1".to_string(),
        },
    ]
}
