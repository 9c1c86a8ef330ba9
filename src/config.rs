//! Settings validation and file locations.

use crate::error::{AppError, AppResult};
use crate::models::Settings;
use log::info;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "ALARMCHIME_DB_PATH";

/// Snooze lengths accepted from settings and from snooze commands.
pub const SNOOZE_MINUTES: RangeInclusive<i64> = 1..=60;

/// Rejects settings the scheduler cannot run with.
pub fn validate_settings(settings: &Settings) -> AppResult<()> {
    if !(0.0..=1.0).contains(&settings.volume) {
        return Err(AppError::config(format!(
            "volume {} must be between 0.0 and 1.0",
            settings.volume
        )));
    }
    if !SNOOZE_MINUTES.contains(&settings.snooze_minutes) {
        return Err(AppError::config(format!(
            "snooze of {} minutes must be between {} and {}",
            settings.snooze_minutes,
            SNOOZE_MINUTES.start(),
            SNOOZE_MINUTES.end()
        )));
    }
    if settings.burst_interval_ms == 0 || settings.vibration_period_ms == 0 {
        return Err(AppError::config("timer periods must be non-zero"));
    }
    if settings.burst_duration_ms == 0 || settings.burst_duration_ms > settings.burst_interval_ms {
        return Err(AppError::config(format!(
            "burst of {}ms must fit in the {}ms burst interval",
            settings.burst_duration_ms, settings.burst_interval_ms
        )));
    }
    Ok(())
}

/// Application data directory, `<data_dir>/alarmchime`.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alarmchime")
}

/// SQLite location: `$ALARMCHIME_DB_PATH` or `<data_dir>/alarmchime/alarms.db`.
pub fn database_path() -> PathBuf {
    match std::env::var(DB_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => data_dir().join("alarms.db"),
    }
}

/// Creates the directory that will hold `path` when it is missing.
pub fn ensure_parent_directory(path: &Path) -> AppResult<()> {
    let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::config(format!("cannot create {}: {}", dir.display(), e)))?;
        info!("Created data directory: {:?}", dir);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let loud = Settings {
            volume: 1.5,
            ..Settings::default()
        };
        assert!(matches!(validate_settings(&loud), Err(AppError::Config(_))));

        let long_burst = Settings {
            burst_duration_ms: 1500,
            ..Settings::default()
        };
        assert!(validate_settings(&long_burst).is_err());

        let no_snooze = Settings {
            snooze_minutes: 0,
            ..Settings::default()
        };
        assert!(validate_settings(&no_snooze).is_err());
    }

    #[test]
    #[serial]
    fn test_database_path_from_env() {
        std::env::set_var(DB_PATH_ENV, "/tmp/alarmchime-test.db");
        assert_eq!(database_path(), PathBuf::from("/tmp/alarmchime-test.db"));
        std::env::remove_var(DB_PATH_ENV);
        assert!(database_path().ends_with("alarmchime/alarms.db"));
    }

    #[test]
    fn test_ensure_parent_directory_creates_missing_dirs() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("nested/deeper/alarms.db");
        ensure_parent_directory(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(ensure_parent_directory(Path::new("alarms.db")).is_ok());
    }
}
