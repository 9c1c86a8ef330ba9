// AlarmChime Library
// Exposes the scheduler core for the console host and for tests

pub mod audio;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod feedback;
pub mod messages;
pub mod models;
pub mod monitor;
pub mod scheduler;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use audio::AudioManager;
pub use clock::{Clock, FakeClock, SystemClock};
pub use database::Database;
pub use error::{AppError, AppResult};
pub use messages::{AlarmEvent, Command};
pub use monitor::AlarmService;
pub use scheduler::{AlarmStore, NotificationSession, Scheduler, SessionOutputs};
pub use storage::{MemoryStorage, Storage};
