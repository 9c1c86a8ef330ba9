//! In-memory alarm records and pending snoozes.
//!
//! Passive data holder: no timing logic and no locking. The scheduler is the
//! only caller and serializes access.

use crate::models::alarm::accent_for;
use crate::models::{Alarm, AlarmId};
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AlarmStore {
    alarms: Vec<Alarm>,
    snoozes: HashMap<AlarmId, NaiveDateTime>,
    last_id: u64,
    dirty: bool,
}

impl AlarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted records, keeping their order.
    ///
    /// Records with a missing or duplicate id are given a fresh one.
    pub fn from_alarms(alarms: Vec<Alarm>) -> Self {
        let mut store = Self {
            last_id: alarms.iter().map(|a| a.id.0).max().unwrap_or(0),
            ..Self::default()
        };
        for alarm in alarms {
            if alarm.id.is_assigned() && store.get(alarm.id).is_some() {
                warn!("Duplicate alarm id {} in stored data, reassigning", alarm.id);
            }
            store.add(alarm);
        }
        store.dirty = false;
        store
    }

    fn next_id(&mut self) -> AlarmId {
        self.last_id += 1;
        AlarmId(self.last_id)
    }

    /// Appends an alarm, assigning a fresh id when it has none or a taken one.
    pub fn add(&mut self, mut alarm: Alarm) -> AlarmId {
        if !alarm.id.is_assigned() || self.get(alarm.id).is_some() {
            alarm.id = self.next_id();
        } else {
            self.last_id = self.last_id.max(alarm.id.0);
        }
        if alarm.color.is_empty() {
            alarm.color = accent_for(alarm.id).to_string();
        }
        let id = alarm.id;
        debug!("Stored alarm {} at {}", id, alarm.time_label());
        self.alarms.push(alarm);
        self.dirty = true;
        id
    }

    /// Replaces the record with `id`, keeping its id and colour.
    ///
    /// Unknown ids are a no-op.
    pub fn update(&mut self, id: AlarmId, mut replacement: Alarm) -> bool {
        let Some(slot) = self.alarms.iter_mut().find(|a| a.id == id) else {
            debug!("Update for unknown alarm {} ignored", id);
            return false;
        };
        replacement.id = id;
        if replacement.color.is_empty() {
            replacement.color = std::mem::take(&mut slot.color);
        }
        *slot = replacement;
        self.dirty = true;
        true
    }

    /// Removes the record and any snooze pending for it.
    pub fn remove(&mut self, id: AlarmId) -> Option<Alarm> {
        let index = self.alarms.iter().position(|a| a.id == id)?;
        self.snoozes.remove(&id);
        self.dirty = true;
        Some(self.alarms.remove(index))
    }

    /// Disabling an alarm also drops its pending snooze.
    pub fn set_enabled(&mut self, id: AlarmId, enabled: bool) -> bool {
        let Some(alarm) = self.alarms.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        if alarm.enabled != enabled {
            alarm.enabled = enabled;
            self.dirty = true;
        }
        if !enabled {
            self.snoozes.remove(&id);
        }
        true
    }

    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == id)
    }

    /// Alarms in insertion order.
    pub fn all(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Sets or overwrites the snooze entry for a known alarm.
    pub fn snooze_until(&mut self, id: AlarmId, fire_at: NaiveDateTime) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.snoozes.insert(id, fire_at);
        true
    }

    pub fn snooze_entry(&self, id: AlarmId) -> Option<NaiveDateTime> {
        self.snoozes.get(&id).copied()
    }

    pub fn clear_snooze(&mut self, id: AlarmId) -> Option<NaiveDateTime> {
        self.snoozes.remove(&id)
    }

    /// Snoozed alarms whose re-fire time has been reached, earliest first.
    pub fn due_snoozes(&self, now: NaiveDateTime) -> Vec<AlarmId> {
        let mut due: Vec<(NaiveDateTime, AlarmId)> = self
            .snoozes
            .iter()
            .filter(|(_, fire_at)| now >= **fire_at)
            .map(|(id, fire_at)| (*fire_at, *id))
            .collect();
        due.sort();
        due.into_iter().map(|(_, id)| id).collect()
    }

    pub fn snooze_count(&self) -> usize {
        self.snoozes.len()
    }

    /// Returns whether records changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{sample_alarms, AlarmDraft};
    use chrono::{Duration, NaiveDate};

    fn draft(time: &str) -> Alarm {
        AlarmDraft::default()
            .with_time(time)
            .unwrap()
            .into_alarm(AlarmId::UNASSIGNED)
            .unwrap()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_add_assigns_ids_in_order() {
        let mut store = AlarmStore::new();
        let a = store.add(draft("07:00"));
        let b = store.add(draft("07:00"));
        assert_ne!(a, b);
        assert_eq!(store.all().iter().map(|x| x.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(store.get(a).unwrap().color, "#FF6B6B");
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_from_alarms_reassigns_duplicates() {
        let mut alarms = sample_alarms();
        alarms.push(alarms[0].clone());
        let mut store = AlarmStore::from_alarms(alarms);
        assert_eq!(store.len(), 4);
        assert_eq!(store.all()[3].id, AlarmId(4));
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_update_keeps_id_and_color() {
        let mut store = AlarmStore::from_alarms(sample_alarms());
        let mut replacement = draft("08:15");
        replacement.label = "Later workout".to_string();
        assert!(store.update(AlarmId(1), replacement));
        let updated = store.get(AlarmId(1)).unwrap();
        assert_eq!(updated.label, "Later workout");
        assert_eq!(updated.color, "#FF6B6B");
        assert_eq!(store.all()[0].id, AlarmId(1));
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut store = AlarmStore::from_alarms(sample_alarms());
        assert!(!store.update(AlarmId(42), draft("09:00")));
        assert!(store.remove(AlarmId(42)).is_none());
        assert!(!store.set_enabled(AlarmId(42), false));
        assert!(!store.snooze_until(AlarmId(42), noon()));
        assert!(!store.take_dirty());
    }

    #[test]
    fn test_set_enabled_keeps_other_fields() {
        let mut store = AlarmStore::from_alarms(sample_alarms());
        let before = store.get(AlarmId(3)).unwrap().clone();
        store.set_enabled(AlarmId(3), false);
        let after = store.get(AlarmId(3)).unwrap();
        assert!(!after.enabled);
        assert_eq!(after.label, before.label);
        assert_eq!(after.repeat, before.repeat);
    }

    #[test]
    fn test_remove_drops_snooze() {
        let mut store = AlarmStore::from_alarms(sample_alarms());
        store.snooze_until(AlarmId(3), noon());
        store.remove(AlarmId(3));
        assert_eq!(store.snooze_count(), 0);
    }

    #[test]
    fn test_snooze_overwrites_and_orders() {
        let mut store = AlarmStore::from_alarms(sample_alarms());
        store.snooze_until(AlarmId(1), noon() + Duration::minutes(10));
        store.snooze_until(AlarmId(1), noon() + Duration::minutes(2));
        store.snooze_until(AlarmId(3), noon() + Duration::minutes(1));
        assert_eq!(store.snooze_count(), 2);
        assert!(store.due_snoozes(noon()).is_empty());
        assert_eq!(
            store.due_snoozes(noon() + Duration::minutes(5)),
            vec![AlarmId(3), AlarmId(1)]
        );
    }
}
