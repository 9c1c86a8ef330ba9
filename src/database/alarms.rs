// file: src/database/alarms.rs
use crate::models::{Alarm, AlarmId, RepeatDays};
use anyhow::{Context, Result};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, FromRow)]
struct AlarmRow {
    id: i64,
    time: String,
    label: String,
    enabled: bool,
    repeat_days: String,
    ringtone: String,
    vibrate: bool,
    color: String,
}

impl TryFrom<AlarmRow> for Alarm {
    type Error = anyhow::Error;

    fn try_from(row: AlarmRow) -> Result<Self> {
        let time = crate::models::alarm::parse_time(&row.time)
            .with_context(|| format!("alarm {} has unreadable time '{}'", row.id, row.time))?;
        let days: Vec<u8> = serde_json::from_str(&row.repeat_days)
            .with_context(|| format!("alarm {} has unreadable repeat days", row.id))?;
        Ok(Alarm {
            id: AlarmId(row.id as u64),
            time,
            label: row.label,
            enabled: row.enabled,
            repeat: RepeatDays::from(days),
            ringtone_id: row.ringtone,
            vibrate: row.vibrate,
            color: row.color,
        })
    }
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Alarm>> {
    let rows = sqlx::query_as::<_, AlarmRow>(
        r#"
        SELECT id, time, label, enabled, repeat_days, ringtone, vibrate, color
        FROM alarms
        ORDER BY position ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch alarms")?;

    rows.into_iter().map(Alarm::try_from).collect()
}

/// Replaces every stored alarm with `alarms` in one transaction.
pub async fn replace_all(pool: &SqlitePool, alarms: &[Alarm]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to open transaction")?;

    sqlx::query("DELETE FROM alarms")
        .execute(&mut *tx)
        .await
        .context("Failed to clear alarms")?;

    for (position, alarm) in alarms.iter().enumerate() {
        let repeat_days = serde_json::to_string(&alarm.repeat)?;
        sqlx::query(
            r#"
            INSERT INTO alarms (id, position, time, label, enabled, repeat_days, ringtone, vibrate, color)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alarm.id.0 as i64)
        .bind(position as i64)
        .bind(alarm.time_label())
        .bind(&alarm.label)
        .bind(alarm.enabled)
        .bind(repeat_days)
        .bind(&alarm.ringtone_id)
        .bind(alarm.vibrate)
        .bind(&alarm.color)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to save alarm {}", alarm.id))?;
    }

    tx.commit().await.context("Failed to commit alarms")?;
    Ok(())
}
