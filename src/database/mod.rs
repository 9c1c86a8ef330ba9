// file: src/database/mod.rs

use crate::error::AppResult;
use crate::models::{sample_alarms, Alarm, Settings};
use crate::storage::Storage;
use crate::utils::logging::log_storage_operation;
use anyhow::{Context, Result};
use log::info;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePool, Sqlite};
use std::path::Path;
use std::time::Instant;

pub mod alarms;
pub mod settings;

/// SQLite-backed storage for alarms and settings.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens the database file at `path`, creating it when missing.
    ///
    /// A freshly created database is seeded with the sample alarms.
    pub async fn open(path: &Path) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        // Create database if it doesn't exist
        let db_exists = Sqlite::database_exists(&db_url)
            .await
            .context("Failed to check if database exists")?;
        if !db_exists {
            info!("Creating database at {}", path.display());
            Sqlite::create_database(&db_url)
                .await
                .context("Failed to create database")?;
        }

        let db = Self::connect(&db_url).await?;

        if !db_exists {
            db.seed_samples().await.context("Failed to seed sample alarms")?;
        }

        Ok(db)
    }

    /// Connects to `db_url` and makes sure the schema exists.
    pub async fn connect(db_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(db_url)
            .await
            .context("Failed to connect to database")?;

        run_schema(&pool).await.context("Failed to run database schema")?;

        info!("Database initialized successfully");

        Ok(Database { pool })
    }

    async fn seed_samples(&self) -> Result<()> {
        let samples = sample_alarms();
        alarms::replace_all(&self.pool, &samples).await?;
        info!("Seeded {} sample alarms", samples.len());
        Ok(())
    }

    // --- Alarm Delegates ---

    pub async fn get_alarms(&self) -> Result<Vec<Alarm>> {
        alarms::get_all(&self.pool).await
    }

    pub async fn replace_alarms(&self, list: &[Alarm]) -> Result<()> {
        let started = Instant::now();
        alarms::replace_all(&self.pool, list).await?;
        log_storage_operation(
            "replace_alarms",
            list.len(),
            started.elapsed().as_millis() as u64,
        );
        Ok(())
    }

    // --- Settings Delegates ---

    pub async fn get_settings(&self) -> Result<Settings> {
        settings::get(&self.pool).await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        settings::update(&self.pool, settings).await
    }
}

impl Storage for Database {
    async fn load_alarms(&self) -> AppResult<Vec<Alarm>> {
        Ok(self.get_alarms().await?)
    }

    async fn persist_alarms(&self, alarms: &[Alarm]) -> AppResult<()> {
        Ok(self.replace_alarms(alarms).await?)
    }

    async fn load_settings(&self) -> AppResult<Settings> {
        Ok(self.get_settings().await?)
    }

    async fn persist_settings(&self, settings: &Settings) -> AppResult<()> {
        Ok(self.update_settings(settings).await?)
    }
}

async fn run_schema(pool: &SqlitePool) -> Result<()> {
    let schema = include_str!("schema.sql");

    let mut current_statement = String::new();

    for line in schema.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }

        current_statement.push_str(line);
        current_statement.push('\n');

        if trimmed.ends_with(';') {
            sqlx::query(&current_statement).execute(pool).await?;
            current_statement.clear();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlarmDraft, AlarmId, RepeatDays};
    use tempfile::NamedTempFile;

    async fn create_test_database() -> Database {
        let temp_file = NamedTempFile::new().unwrap();
        let (_, path) = temp_file.keep().unwrap();
        let db_path = format!("sqlite:{}", path.to_str().unwrap());

        Database::connect(&db_path).await.unwrap()
    }

    #[tokio::test]
    async fn test_database_connect() {
        let db = create_test_database().await;
        assert!(!db.pool.is_closed());
        assert!(db.get_alarms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_seeds_new_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarms.db");

        let db = Database::open(&path).await.unwrap();
        let alarms = db.get_alarms().await.unwrap();
        assert_eq!(alarms, sample_alarms());

        // Reopening must not seed again
        db.replace_alarms(&alarms[..1]).await.unwrap();
        db.pool.close().await;
        let reopened = Database::open(&path).await.unwrap();
        assert_eq!(reopened.get_alarms().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_alarms_keeps_order() {
        let db = create_test_database().await;
        let mut alarms = sample_alarms();
        alarms.reverse();
        let mut extra = AlarmDraft::default()
            .with_time("23:59")
            .unwrap()
            .into_alarm(AlarmId(10))
            .unwrap();
        extra.repeat = RepeatDays::from_days([0, 6]).unwrap();
        alarms.push(extra);

        db.replace_alarms(&alarms).await.unwrap();
        let loaded = db.get_alarms().await.unwrap();
        assert_eq!(loaded, alarms);

        db.replace_alarms(&[]).await.unwrap();
        assert!(db.get_alarms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_settings_default() {
        let db = create_test_database().await;
        let settings = db.get_settings().await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_update_settings() {
        let db = create_test_database().await;
        let mut settings = Settings::default();
        settings.volume = 0.5;
        settings.muted = true;
        settings.snooze_minutes = 10;

        db.update_settings(&settings).await.unwrap();

        let retrieved = db.get_settings().await.unwrap();
        assert_eq!(retrieved.volume, 0.5);
        assert!(retrieved.muted);
        assert_eq!(retrieved.snooze_minutes, 10);
    }

    #[tokio::test]
    async fn test_unreadable_setting_falls_back() {
        let db = create_test_database().await;
        sqlx::query("UPDATE settings SET value = 'loud' WHERE key = 'volume'")
            .execute(&db.pool)
            .await
            .unwrap();
        assert_eq!(db.get_settings().await.unwrap().volume, 0.7);
    }
}
