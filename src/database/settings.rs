// file: src/database/settings.rs
use crate::models::Settings;
use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, FromRow)]
struct Setting {
    key: String,
    value: String,
}

pub async fn get(pool: &SqlitePool) -> Result<Settings> {
    let settings = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;

    // Unparseable values fall back to defaults
    let defaults = Settings::default();
    let mut app_settings = Settings::default();
    for setting in settings {
        let value = setting.value.trim();
        match setting.key.as_str() {
            "volume" => app_settings.volume = value.parse().unwrap_or(defaults.volume),
            "muted" => app_settings.muted = value.parse().unwrap_or(defaults.muted),
            "snooze_minutes" => {
                app_settings.snooze_minutes = value.parse().unwrap_or(defaults.snooze_minutes)
            }
            "burst_interval_ms" => {
                app_settings.burst_interval_ms =
                    value.parse().unwrap_or(defaults.burst_interval_ms)
            }
            "burst_duration_ms" => {
                app_settings.burst_duration_ms =
                    value.parse().unwrap_or(defaults.burst_duration_ms)
            }
            "vibration_period_ms" => {
                app_settings.vibration_period_ms =
                    value.parse().unwrap_or(defaults.vibration_period_ms)
            }
            "theme" => app_settings.theme = value.to_string(),
            _ => {}
        }
    }

    Ok(app_settings)
}

pub async fn update(pool: &SqlitePool, settings: &Settings) -> Result<()> {
    let updates = [
        ("volume", settings.volume.to_string()),
        ("muted", settings.muted.to_string()),
        ("snooze_minutes", settings.snooze_minutes.to_string()),
        ("burst_interval_ms", settings.burst_interval_ms.to_string()),
        ("burst_duration_ms", settings.burst_duration_ms.to_string()),
        ("vibration_period_ms", settings.vibration_period_ms.to_string()),
        ("theme", settings.theme.clone()),
    ];

    for (key, value) in updates {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    }

    Ok(())
}
