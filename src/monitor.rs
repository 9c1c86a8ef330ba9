//! Runtime loop driving the scheduler.
//!
//! `AlarmService` owns the scheduler and forwards every mutation to it from a
//! single task, so the announcing slot has exactly one writer. It polls the
//! clock once per second, applies presentation-layer commands, and writes
//! changed alarm records back to storage.

use crate::clock::{until_next_second, Clock};
use crate::config::{validate_settings, SNOOZE_MINUTES};
use crate::error::{AppError, AppResult};
use crate::messages::{AlarmEvent, Command};
use crate::models::{AlarmId, Settings};
use crate::scheduler::{AlarmStore, Scheduler, SessionOutputs};
use crate::storage::Storage;
use chrono::Duration;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub const POLL_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);

pub struct AlarmService<S: Storage, C: Clock> {
    scheduler: Scheduler,
    storage: S,
    clock: C,
    settings: Settings,
    events: UnboundedSender<AlarmEvent>,
}

impl<S: Storage, C: Clock> AlarmService<S, C> {
    /// Loads alarms from `storage` and prepares a scheduler around them.
    pub async fn load(
        storage: S,
        clock: C,
        outputs: SessionOutputs,
        settings: Settings,
        events: UnboundedSender<AlarmEvent>,
    ) -> AppResult<Self> {
        validate_settings(&settings)?;
        let alarms = storage.load_alarms().await?;
        info!("Loaded {} alarms", alarms.len());

        let scheduler =
            Scheduler::new(AlarmStore::from_alarms(alarms), outputs).with_events(events.clone());

        Ok(Self {
            scheduler,
            storage,
            clock,
            settings,
            events,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn emit(&self, event: AlarmEvent) {
        let _ = self.events.send(event);
    }

    /// One poll of the clock. Returns the alarms that fired.
    pub async fn tick(&mut self) -> Vec<AlarmId> {
        let now = self.clock.now();
        let fired = self.scheduler.tick(now);
        self.sync_alarms().await;
        fired
    }

    /// Applies a command. Rejections are reported as `AlarmEvent::Error`.
    pub async fn handle_command(&mut self, command: Command) {
        debug!("Handling command: {:?}", command);
        if let Err(e) = self.apply(command).await {
            if e.is_user_facing() {
                warn!("Command rejected: {}", e);
            } else {
                error!("Command failed: {}", e);
            }
            self.emit(AlarmEvent::Error(e.to_safe_string()));
        }
        self.sync_alarms().await;
    }

    async fn apply(&mut self, command: Command) -> AppResult<()> {
        match command {
            Command::AddAlarm(draft) => {
                let alarm = draft.into_alarm(AlarmId::UNASSIGNED)?;
                let id = self.scheduler.add(alarm);
                info!("Added alarm {}", id);
            }
            Command::UpdateAlarm(id, draft) => {
                if self.scheduler.store().get(id).is_none() {
                    return Err(AppError::not_found(format!("alarm {}", id)));
                }
                // Saving an edit re-enables the alarm
                let alarm = draft.into_alarm(id)?;
                self.scheduler.update(id, alarm);
                info!("Updated alarm {}", id);
            }
            Command::RemoveAlarm(id) => {
                self.scheduler
                    .remove(id)
                    .ok_or_else(|| AppError::not_found(format!("alarm {}", id)))?;
                info!("Removed alarm {}", id);
            }
            Command::SetEnabled(id, enabled) => {
                if !self.scheduler.set_enabled(id, enabled) {
                    return Err(AppError::not_found(format!("alarm {}", id)));
                }
            }
            Command::Dismiss(id) => {
                self.scheduler.dismiss(id);
            }
            Command::Snooze(id, minutes) => {
                let offset = match minutes {
                    Some(m) if !SNOOZE_MINUTES.contains(&m) => {
                        return Err(AppError::invalid_input(format!(
                            "snooze of {} minutes must be between {} and {}",
                            m,
                            SNOOZE_MINUTES.start(),
                            SNOOZE_MINUTES.end()
                        )))
                    }
                    Some(m) => Duration::minutes(m),
                    None => self.settings.snooze_offset(),
                };
                let now = self.clock.now();
                self.scheduler
                    .snooze(id, now, offset)
                    .ok_or_else(|| AppError::not_found(format!("alarm {}", id)))?;
            }
            Command::SetVolume(volume) => {
                if !volume.is_finite() {
                    return Err(AppError::invalid_input("volume must be a number"));
                }
                self.settings.volume = self.scheduler.outputs().audio.set_volume(volume);
                self.volume_changed().await?;
            }
            Command::ToggleMute => {
                self.settings.muted = self.scheduler.outputs().audio.toggle_mute();
                self.volume_changed().await?;
            }
            Command::TestAudio => {
                self.scheduler.outputs().audio.test_audio()?;
            }
            Command::ListAlarms => {
                self.emit(AlarmEvent::AlarmsChanged(self.scheduler.store().all().to_vec()));
            }
        }
        Ok(())
    }

    async fn volume_changed(&mut self) -> AppResult<()> {
        self.emit(AlarmEvent::VolumeChanged {
            volume: self.settings.volume,
            muted: self.settings.muted,
        });
        self.storage.persist_settings(&self.settings).await
    }

    /// Publishes and persists the alarm list when records changed.
    async fn sync_alarms(&mut self) {
        if !self.scheduler.take_dirty() {
            return;
        }
        let alarms = self.scheduler.store().all().to_vec();
        if let Err(e) = self.storage.persist_alarms(&alarms).await {
            error!("Failed to save alarms: {}", e);
            self.emit(AlarmEvent::Error(e.to_safe_string()));
        }
        self.emit(AlarmEvent::AlarmsChanged(alarms));
    }

    /// Polls once per second and serves commands until `shutdown` fires or
    /// every command sender is dropped. Ends any announcing session on exit.
    pub async fn run(mut self, mut commands: Receiver<Command>, shutdown: CancellationToken) {
        info!("Starting alarm service");

        let start = Instant::now() + until_next_second(&self.clock.now());
        let mut ticker = interval_at(start, POLL_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping alarm service");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        info!("Command channel closed, stopping alarm service");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let fired = self.tick().await;
                    if !fired.is_empty() {
                        debug!("Tick fired {:?}", fired);
                    }
                }
            }
        }

        self.scheduler.shutdown();
        self.sync_alarms().await;
        info!("Alarm service stopped gracefully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioManager;
    use crate::clock::FakeClock;
    use crate::models::{sample_alarms, AlarmDraft, SessionState};
    use crate::storage::MemoryStorage;
    use chrono::{NaiveDate, NaiveDateTime};
    use tokio::sync::mpsc;

    fn tuesday(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    async fn service(
        storage: MemoryStorage,
        clock: FakeClock,
    ) -> (
        AlarmService<MemoryStorage, FakeClock>,
        mpsc::UnboundedReceiver<AlarmEvent>,
    ) {
        let settings = Settings::default();
        let outputs = SessionOutputs::new(AudioManager::new_dummy(&settings), &settings);
        let (tx, rx) = mpsc::unbounded_channel();
        let service = AlarmService::load(storage, clock, outputs, settings, tx)
            .await
            .unwrap();
        (service, rx)
    }

    #[tokio::test]
    async fn test_invalid_draft_reports_error() {
        let storage = MemoryStorage::new();
        let (mut service, mut rx) = service(storage.clone(), FakeClock::new(tuesday(9, 0, 0))).await;

        service
            .handle_command(Command::AddAlarm(AlarmDraft::default()))
            .await;
        assert_eq!(
            rx.try_recv().unwrap(),
            AlarmEvent::Error("Invalid input: Please select a time for the alarm".to_string())
        );
        assert!(service.scheduler().store().is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[tokio::test]
    async fn test_add_persists_and_publishes() {
        let storage = MemoryStorage::with_alarms(sample_alarms());
        let (mut service, mut rx) = service(storage.clone(), FakeClock::new(tuesday(9, 0, 0))).await;

        let draft = AlarmDraft::default().with_time("06:45").unwrap();
        service.handle_command(Command::AddAlarm(draft)).await;

        let saved = storage.snapshot();
        assert_eq!(saved.len(), 4);
        assert_eq!(saved[3].label, "Alarm");
        assert_eq!(saved[3].id, AlarmId(4));
        assert!(matches!(rx.try_recv(), Ok(AlarmEvent::AlarmsChanged(list)) if list.len() == 4));
    }

    #[tokio::test]
    async fn test_edit_unknown_alarm_is_rejected() {
        let storage = MemoryStorage::with_alarms(sample_alarms());
        let (mut service, mut rx) = service(storage, FakeClock::new(tuesday(9, 0, 0))).await;

        let draft = AlarmDraft::default().with_time("06:45").unwrap();
        service
            .handle_command(Command::UpdateAlarm(AlarmId(9), draft))
            .await;
        assert!(matches!(rx.try_recv(), Ok(AlarmEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_edit_re_enables_alarm() {
        let storage = MemoryStorage::with_alarms(sample_alarms());
        let (mut service, _rx) = service(storage.clone(), FakeClock::new(tuesday(9, 0, 0))).await;

        let lunch = service.scheduler().store().get(AlarmId(2)).unwrap().clone();
        assert!(!lunch.enabled);
        let mut draft = AlarmDraft::from_alarm(&lunch);
        draft.label = "Late lunch".to_string();
        service
            .handle_command(Command::UpdateAlarm(AlarmId(2), draft))
            .await;

        let saved = &storage.snapshot()[1];
        assert!(saved.enabled);
        assert_eq!(saved.label, "Late lunch");
        assert_eq!(saved.color, lunch.color);
    }

    #[tokio::test]
    async fn test_tick_uses_injected_clock() {
        let clock = FakeClock::new(tuesday(6, 59, 59));
        let (mut service, _rx) =
            service(MemoryStorage::with_alarms(sample_alarms()), clock.clone()).await;

        assert!(service.tick().await.is_empty());
        clock.advance(Duration::seconds(1));
        assert_eq!(service.tick().await, vec![AlarmId(1)]);
        assert_eq!(
            service.scheduler().state(),
            SessionState::Announcing(AlarmId(1))
        );
    }

    #[tokio::test]
    async fn test_snooze_rejects_non_positive_minutes() {
        let (mut service, mut rx) = service(
            MemoryStorage::with_alarms(sample_alarms()),
            FakeClock::new(tuesday(7, 0, 0)),
        )
        .await;
        service.handle_command(Command::Snooze(AlarmId(1), Some(0))).await;
        assert!(matches!(rx.try_recv(), Ok(AlarmEvent::Error(_))));
        assert_eq!(service.scheduler().store().snooze_count(), 0);
    }

    #[tokio::test]
    async fn test_snooze_beyond_range_is_rejected() {
        let clock = FakeClock::new(tuesday(7, 0, 0));
        let (mut service, mut rx) = service(
            MemoryStorage::with_alarms(sample_alarms()),
            clock.clone(),
        )
        .await;
        assert_eq!(service.tick().await, vec![AlarmId(1)]);
        while rx.try_recv().is_ok() {}

        for minutes in [61, 1_000_000_000_000, i64::MAX] {
            service
                .handle_command(Command::Snooze(AlarmId(1), Some(minutes)))
                .await;
            assert!(matches!(rx.try_recv(), Ok(AlarmEvent::Error(_))));
        }
        assert_eq!(service.scheduler().store().snooze_count(), 0);
        assert_eq!(
            service.scheduler().state(),
            SessionState::Announcing(AlarmId(1))
        );

        // The service keeps serving commands afterwards
        service.handle_command(Command::Snooze(AlarmId(1), Some(60))).await;
        assert_eq!(
            service.scheduler().store().snooze_entry(AlarmId(1)),
            Some(tuesday(8, 0, 0))
        );
    }

    #[tokio::test]
    async fn test_non_finite_volume_is_rejected() {
        let storage = MemoryStorage::new();
        let (mut service, mut rx) = service(storage.clone(), FakeClock::new(tuesday(9, 0, 0))).await;

        for volume in [f32::NAN, f32::INFINITY] {
            service.handle_command(Command::SetVolume(volume)).await;
            assert!(matches!(rx.try_recv(), Ok(AlarmEvent::Error(_))));
        }
        assert_eq!(service.settings().volume, 0.7);
        assert_eq!(service.scheduler().outputs().audio.get_volume(), 0.7);
        assert_eq!(storage.settings().volume, 0.7);
    }

    #[tokio::test]
    async fn test_volume_change_is_saved() {
        let storage = MemoryStorage::new();
        let (mut service, mut rx) = service(storage.clone(), FakeClock::new(tuesday(9, 0, 0))).await;

        service.handle_command(Command::SetVolume(0.25)).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            AlarmEvent::VolumeChanged {
                volume: 0.25,
                muted: false
            }
        );
        service.handle_command(Command::ToggleMute).await;
        assert!(storage.settings().muted);
        assert_eq!(storage.settings().volume, 0.25);
    }
}
