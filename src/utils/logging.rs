use crate::models::{AlarmId, FireNotice, SessionOutcome};
use env_logger::{Builder, Target};
use log::{Level, LevelFilter, SetLoggerError};
use std::env;
use std::io::Write;

pub fn parse_level(raw: &str) -> LevelFilter {
    match raw.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

pub fn init_logging() -> Result<(), SetLoggerError> {
    let log_level = parse_level(&env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()));

    let mut builder = Builder::new();

    // Customize format for better readability
    builder.format(|buf, record| {
        let timestamp = buf.timestamp();
        let target = record.target();
        match record.level() {
            Level::Info => writeln!(buf, "{} [INFO] [{}]: {}", timestamp, target, record.args()),
            level => writeln!(
                buf,
                "{} [{}] [{}:{}] {}: {}",
                timestamp,
                level,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                target,
                record.args()
            ),
        }
    });

    // Keep driver chatter out of the console
    builder.filter_module("sqlx", LevelFilter::Warn);
    builder.filter_module("rodio", LevelFilter::Warn);
    builder.filter_module("cpal", LevelFilter::Warn);

    builder.filter_level(log_level).target(Target::Stderr).try_init()
}

pub fn log_error_with_context(error: &anyhow::Error, context: &str) {
    log::error!("[{}] {}", context, error);

    // Log chain of causes for better debugging
    for cause in error.chain().skip(1) {
        log::error!("  Caused by: {}", cause);
    }
}

pub fn log_alarm_fired(notice: &FireNotice) {
    log::info!(
        "[Alarm] {} '{}' firing at {}{}",
        notice.alarm_id,
        notice.label,
        notice.fired_at.format("%H:%M:%S"),
        if notice.from_snooze { " (snoozed)" } else { "" }
    );
}

pub fn log_session_end(alarm_id: AlarmId, outcome: SessionOutcome) {
    log::info!("[Alarm] {} session ended: {:?}", alarm_id, outcome);
}

pub fn log_storage_operation(operation: &str, rows: usize, duration_ms: u64) {
    log::debug!("[Storage] {} of {} rows took {}ms", operation, rows, duration_ms);
}
