//! Storage port for alarms and settings.
//!
//! The scheduler never talks to a storage technology directly; the host
//! injects one of these. `Database` is the SQLite implementation.

use crate::error::AppResult;
use crate::models::{Alarm, Settings};
use std::future::Future;
use std::sync::{Arc, Mutex};

pub trait Storage: Send + Sync {
    fn load_alarms(&self) -> impl Future<Output = AppResult<Vec<Alarm>>> + Send;

    /// Replaces the stored alarm list with `alarms`, keeping their order.
    fn persist_alarms(&self, alarms: &[Alarm]) -> impl Future<Output = AppResult<()>> + Send;

    fn load_settings(&self) -> impl Future<Output = AppResult<Settings>> + Send;

    fn persist_settings(&self, settings: &Settings) -> impl Future<Output = AppResult<()>> + Send;
}

/// Process-local storage, used by tests and embedders without a disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    alarms: Arc<Mutex<Vec<Alarm>>>,
    settings: Arc<Mutex<Settings>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alarms(alarms: Vec<Alarm>) -> Self {
        Self {
            alarms: Arc::new(Mutex::new(alarms)),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of `persist_alarms` calls so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    async fn load_alarms(&self) -> AppResult<Vec<Alarm>> {
        Ok(self.snapshot())
    }

    async fn persist_alarms(&self, alarms: &[Alarm]) -> AppResult<()> {
        *self.alarms.lock().unwrap_or_else(|e| e.into_inner()) = alarms.to_vec();
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    async fn load_settings(&self) -> AppResult<Settings> {
        Ok(self.settings())
    }

    async fn persist_settings(&self, settings: &Settings) -> AppResult<()> {
        *self.settings.lock().unwrap_or_else(|e| e.into_inner()) = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_alarms;

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load_alarms().await.unwrap().is_empty());

        storage.persist_alarms(&sample_alarms()).await.unwrap();
        let loaded = storage.load_alarms().await.unwrap();
        assert_eq!(loaded, sample_alarms());
        assert_eq!(storage.write_count(), 1);

        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        storage.persist_settings(&settings).await.unwrap();
        assert!(storage.load_settings().await.unwrap().muted);
    }
}
