//! Decides when alarms fire.
//!
//! The scheduler is the only writer of the announcing slot. It is driven by
//! `tick`, called once per second with the current wall-clock time, and by
//! the dismiss/snooze/CRUD calls forwarded from the presentation layer.

pub mod session;
pub mod store;

pub use session::{NotificationSession, SessionOutputs};
pub use store::AlarmStore;

use crate::messages::AlarmEvent;
use crate::models::{Alarm, AlarmId, FireNotice, SessionOutcome, SessionState};
use crate::utils::logging::{log_alarm_fired, log_session_end};
use chrono::{Duration, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

enum Slot {
    Idle,
    Announcing(NotificationSession),
}

pub struct Scheduler {
    store: AlarmStore,
    outputs: SessionOutputs,
    slot: Slot,
    events: Option<UnboundedSender<AlarmEvent>>,
}

impl Scheduler {
    pub fn new(store: AlarmStore, outputs: SessionOutputs) -> Self {
        Self {
            store,
            outputs,
            slot: Slot::Idle,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: UnboundedSender<AlarmEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn store(&self) -> &AlarmStore {
        &self.store
    }

    pub fn outputs(&self) -> &SessionOutputs {
        &self.outputs
    }

    pub fn state(&self) -> SessionState {
        match &self.slot {
            Slot::Idle => SessionState::Idle,
            Slot::Announcing(session) => SessionState::Announcing(session.alarm_id()),
        }
    }

    pub fn active_session(&self) -> Option<&NotificationSession> {
        match &self.slot {
            Slot::Idle => None,
            Slot::Announcing(session) => Some(session),
        }
    }

    fn emit(&self, event: AlarmEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Evaluates the alarm set against `now`. Returns the alarms that fired.
    ///
    /// Time-of-day matches are only evaluated on second 0, so each alarm
    /// matches at most once per minute. At most one match fires per tick: it
    /// supersedes a session for a different alarm started on an earlier tick,
    /// while further matches in the same tick are deferred and not fired
    /// later in the minute. Due snoozes are checked on every tick and stay
    /// pending while a different alarm is announcing.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<AlarmId> {
        let mut fired = Vec::new();

        if now.second() == 0 {
            let due: Vec<Alarm> = self
                .store
                .all()
                .iter()
                .filter(|alarm| alarm.matches(&now))
                .cloned()
                .collect();
            let mut fired_this_tick = false;
            for alarm in due {
                match self.state() {
                    SessionState::Announcing(active) if active == alarm.id => {
                        debug!("Alarm {} already announcing", alarm.id);
                    }
                    SessionState::Announcing(active) if fired_this_tick => {
                        info!(
                            "Alarm {} due while alarm {} is announcing, deferred",
                            alarm.id, active
                        );
                    }
                    state => {
                        if let SessionState::Announcing(active) = state {
                            info!("Alarm {} due, superseding alarm {}", alarm.id, active);
                        }
                        let id = alarm.id;
                        if self.fire_alarm(alarm, now, false) {
                            fired.push(id);
                            fired_this_tick = true;
                        }
                    }
                }
            }
        }

        for id in self.store.due_snoozes(now) {
            if let SessionState::Announcing(active) = self.state() {
                if active != id {
                    debug!("Snoozed alarm {} waits for alarm {}", id, active);
                    continue;
                }
            }
            self.store.clear_snooze(id);
            if let Some(alarm) = self.store.get(id).cloned() {
                if self.fire_alarm(alarm, now, true) {
                    fired.push(id);
                }
            }
        }

        fired
    }

    /// Fires `id` directly, replacing a session for a different alarm.
    ///
    /// Firing an alarm that is already announcing is a no-op.
    pub fn fire(&mut self, id: AlarmId, now: NaiveDateTime) -> bool {
        match self.store.get(id).cloned() {
            Some(alarm) => self.fire_alarm(alarm, now, false),
            None => false,
        }
    }

    fn fire_alarm(&mut self, alarm: Alarm, now: NaiveDateTime, from_snooze: bool) -> bool {
        if self.state().is_announcing(alarm.id) {
            return false;
        }
        self.end_session(SessionOutcome::Superseded);

        let session = NotificationSession::start(&alarm, &self.outputs);
        self.slot = Slot::Announcing(session);

        let notice = FireNotice::new(&alarm, now, from_snooze);
        log_alarm_fired(&notice);
        self.emit(AlarmEvent::Fired(notice));
        true
    }

    /// Ends the announcing session, if any, returning the alarm it targeted.
    fn end_session(&mut self, outcome: SessionOutcome) -> Option<AlarmId> {
        let Slot::Announcing(session) = std::mem::replace(&mut self.slot, Slot::Idle) else {
            return None;
        };
        let alarm_id = session.alarm_id();
        session.end(outcome);
        log_session_end(alarm_id, outcome);
        self.emit(AlarmEvent::SessionEnded { alarm_id, outcome });
        Some(alarm_id)
    }

    /// Stops the session announcing `id`. One-shot alarms are disabled.
    ///
    /// Returns false when `id` is not the announcing alarm.
    pub fn dismiss(&mut self, id: AlarmId) -> bool {
        if !self.state().is_announcing(id) {
            debug!("Dismiss for alarm {} ignored, not announcing", id);
            return false;
        }
        self.end_session(SessionOutcome::Dismissed);
        if self.store.get(id).is_some_and(Alarm::is_one_shot) {
            self.store.set_enabled(id, false);
            info!("One-shot alarm {} disabled after dismissal", id);
        }
        true
    }

    /// Schedules `id` to re-fire at `now + offset`, overwriting any earlier
    /// snooze. Ends the session if `id` is announcing.
    ///
    /// Returns `None` for unknown ids and for offsets past the calendar range.
    pub fn snooze(
        &mut self,
        id: AlarmId,
        now: NaiveDateTime,
        offset: Duration,
    ) -> Option<NaiveDateTime> {
        self.store.get(id)?;
        let Some(fire_at) = now.checked_add_signed(offset) else {
            warn!("Snooze of alarm {} by {} is out of range", id, offset);
            return None;
        };
        if self.state().is_announcing(id) {
            self.end_session(SessionOutcome::Snoozed);
        }
        self.store.snooze_until(id, fire_at);
        info!("Alarm {} snoozed until {}", id, fire_at.format("%H:%M:%S"));
        self.emit(AlarmEvent::Snoozed {
            alarm_id: id,
            fire_at,
        });
        Some(fire_at)
    }

    /// Time left before a snoozed alarm re-fires.
    pub fn snooze_remaining(&self, id: AlarmId, now: NaiveDateTime) -> Option<Duration> {
        let fire_at = self.store.snooze_entry(id)?;
        Some((fire_at - now).max(Duration::zero()))
    }

    pub fn add(&mut self, alarm: Alarm) -> AlarmId {
        self.store.add(alarm)
    }

    pub fn update(&mut self, id: AlarmId, alarm: Alarm) -> bool {
        self.store.update(id, alarm)
    }

    /// Deletes an alarm, ending its session if it is announcing.
    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        if self.state().is_announcing(id) {
            self.end_session(SessionOutcome::Removed);
        }
        self.store.remove(id)
    }

    pub fn set_enabled(&mut self, id: AlarmId, enabled: bool) -> bool {
        self.store.set_enabled(id, enabled)
    }

    /// Whether alarm records changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        self.store.take_dirty()
    }

    pub fn shutdown(&mut self) {
        self.end_session(SessionOutcome::Shutdown);
    }
}
