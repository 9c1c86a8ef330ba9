use alarmchime::{
    sample_alarms, AlarmDraft, AlarmEvent, AlarmId, AlarmService, AudioManager, Command, Database,
    FakeClock, SessionOutputs, Settings, Storage,
};
use chrono::NaiveDate;
use tempfile::TempDir;
use tokio_test::assert_ok;
use tokio::sync::mpsc;

async fn open_in(dir: &TempDir) -> Database {
    Database::open(&dir.path().join("alarms.db")).await.unwrap()
}

#[tokio::test]
async fn test_new_database_has_samples_and_default_settings() {
    let dir = TempDir::new().unwrap();
    let db = open_in(&dir).await;

    let alarms = db.load_alarms().await.unwrap();
    assert_eq!(alarms.len(), 3);
    assert_eq!(alarms[0].label, "Morning Workout");
    assert!(!alarms[1].enabled);
    assert_eq!(db.load_settings().await.unwrap(), Settings::default());
}

#[tokio::test]
async fn test_storage_port_round_trip() {
    let dir = TempDir::new().unwrap();
    let db = open_in(&dir).await;

    let mut alarms = sample_alarms();
    alarms.remove(1);
    alarms[0].label = "Gym".to_string();
    assert_ok!(db.persist_alarms(&alarms).await);

    let settings = Settings {
        volume: 0.3,
        snooze_minutes: 9,
        ..Settings::default()
    };
    assert_ok!(db.persist_settings(&settings).await);

    let loaded = db.load_alarms().await.unwrap();
    assert_eq!(loaded, alarms);
    assert_eq!(loaded[1].id, AlarmId(3));
    assert_eq!(db.load_settings().await.unwrap(), settings);
}

#[tokio::test]
async fn test_service_changes_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = FakeClock::new(
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    );
    let settings = Settings::default();

    {
        let db = open_in(&dir).await;
        let outputs = SessionOutputs::new(AudioManager::new_dummy(&settings), &settings);
        let (tx, _rx) = mpsc::unbounded_channel::<AlarmEvent>();
        let mut service = AlarmService::load(db.clone(), clock.clone(), outputs, settings.clone(), tx)
            .await
            .unwrap();

        let mut draft = AlarmDraft::default().with_time("05:30").unwrap();
        draft.label = "Flight".to_string();
        service.handle_command(Command::AddAlarm(draft)).await;
        service.handle_command(Command::RemoveAlarm(AlarmId(2))).await;
        service.handle_command(Command::SetVolume(0.4)).await;
        db.pool.close().await;
    }

    let db = open_in(&dir).await;
    let alarms = db.load_alarms().await.unwrap();
    let ids: Vec<AlarmId> = alarms.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![AlarmId(1), AlarmId(3), AlarmId(4)]);
    assert_eq!(alarms[2].label, "Flight");
    assert_eq!(alarms[2].color, "#96CEB4");
    assert_eq!(db.load_settings().await.unwrap().volume, 0.4);
}
