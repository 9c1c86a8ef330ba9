use crate::error::{AppError, AppResult};
use crate::models::{Alarm, AlarmDraft, AlarmId, FireNotice, RepeatDays, SessionOutcome};
use chrono::NaiveDateTime;

/// Mutation requests from the presentation layer.
///
/// These are the only way the UI changes alarms or the announcing session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ===== Alarm CRUD =====
    /// Validate and store a new alarm
    AddAlarm(AlarmDraft),
    /// Replace an existing alarm's fields
    UpdateAlarm(AlarmId, AlarmDraft),
    /// Delete an alarm
    RemoveAlarm(AlarmId),
    /// Turn an alarm on or off
    SetEnabled(AlarmId, bool),

    // ===== Session actions =====
    /// Stop the announcing alarm; one-shot alarms are disabled
    Dismiss(AlarmId),
    /// Stop the announcing alarm and re-fire it later (minutes, default from settings)
    Snooze(AlarmId, Option<i64>),

    // ===== Audio =====
    SetVolume(f32),
    ToggleMute,
    /// Play one burst of the default ringtone
    TestAudio,

    /// Ask for an `AlarmsChanged` event with the current list
    ListAlarms,
}

/// Events sent back to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AlarmEvent {
    /// A session entered the announcing state
    Fired(FireNotice),
    /// The announcing session ended and the slot is idle again
    SessionEnded {
        alarm_id: AlarmId,
        outcome: SessionOutcome,
    },
    Snoozed {
        alarm_id: AlarmId,
        fire_at: NaiveDateTime,
    },
    AlarmsChanged(Vec<Alarm>),
    VolumeChanged {
        volume: f32,
        muted: bool,
    },
    /// A rejected command or a background failure, already user-facing
    Error(String),
}

impl Command {
    /// Parses one console line, e.g. `add 07:00 1,2,3,4,5 Morning run`.
    pub fn parse(line: &str) -> AppResult<Command> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| AppError::invalid_input("empty command"))?
            .to_lowercase();
        let rest: Vec<&str> = words.collect();

        match verb.as_str() {
            "add" => Ok(Command::AddAlarm(parse_draft(&rest)?)),
            "edit" => {
                let (id, rest) = split_id(&rest)?;
                Ok(Command::UpdateAlarm(id, parse_draft(rest)?))
            }
            "remove" | "delete" => Ok(Command::RemoveAlarm(only_id(&rest)?)),
            "enable" => Ok(Command::SetEnabled(only_id(&rest)?, true)),
            "disable" => Ok(Command::SetEnabled(only_id(&rest)?, false)),
            "dismiss" => Ok(Command::Dismiss(only_id(&rest)?)),
            "snooze" => {
                let (id, rest) = split_id(&rest)?;
                let minutes = match rest.first() {
                    Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                        AppError::invalid_input(format!("'{}' is not a number of minutes", raw))
                    })?),
                    None => None,
                };
                Ok(Command::Snooze(id, minutes))
            }
            "volume" => {
                let raw = rest
                    .first()
                    .ok_or_else(|| AppError::invalid_input("volume needs a value"))?;
                let volume = raw
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        AppError::invalid_input(format!("'{}' is not a volume level", raw))
                    })?;
                Ok(Command::SetVolume(volume))
            }
            "mute" => Ok(Command::ToggleMute),
            "test" => Ok(Command::TestAudio),
            "list" | "ls" => Ok(Command::ListAlarms),
            other => Err(AppError::invalid_input(format!("unknown command '{}'", other))),
        }
    }
}

fn parse_id(raw: &str) -> AppResult<AlarmId> {
    raw.parse::<u64>()
        .map(AlarmId)
        .map_err(|_| AppError::invalid_input(format!("'{}' is not an alarm id", raw)))
}

fn split_id<'a, 'b>(rest: &'a [&'b str]) -> AppResult<(AlarmId, &'a [&'b str])> {
    let (first, tail) = rest
        .split_first()
        .ok_or_else(|| AppError::invalid_input("missing alarm id"))?;
    Ok((parse_id(first)?, tail))
}

fn only_id(rest: &[&str]) -> AppResult<AlarmId> {
    Ok(split_id(rest)?.0)
}

/// `HH:MM [once|daily|weekdays|1,2,3] [label...]`
fn parse_draft(rest: &[&str]) -> AppResult<AlarmDraft> {
    let (time, rest) = rest
        .split_first()
        .ok_or_else(|| AppError::invalid_input("Please select a time for the alarm"))?;
    let mut draft = AlarmDraft::default().with_time(time)?;

    let mut label_words = rest;
    if let Some((first, tail)) = rest.split_first() {
        if let Ok(days) = RepeatDays::parse(first) {
            draft.repeat = days;
            label_words = tail;
        }
    }

    let mut words = Vec::new();
    for word in label_words {
        match *word {
            "+vibrate" => draft.vibrate = true,
            w if w.starts_with("+tone=") => {
                draft.ringtone_id = w.trim_start_matches("+tone=").replace('_', " ")
            }
            w => words.push(w),
        }
    }
    draft.label = words.join(" ");
    Ok(draft)
}
