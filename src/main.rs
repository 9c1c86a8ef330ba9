// AlarmChime - console alarm clock
// Main entry point: wires storage, audio and the scheduler to stdin/stdout

use alarmchime::clock::SystemClock;
use alarmchime::config::{database_path, ensure_parent_directory, validate_settings};
use alarmchime::models::Settings;
use alarmchime::utils::format_countdown;
use alarmchime::utils::logging::{init_logging, log_error_with_context};
use alarmchime::{AlarmEvent, AlarmService, AudioManager, Command, Database, SessionOutputs};
use log::{error, info, warn};
use std::io::BufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
Commands:
  list                                   show all alarms
  add HH:MM [days] [label] [+vibrate] [+tone=Name]
  edit ID HH:MM [days] [label] [+vibrate] [+tone=Name]
  remove ID | enable ID | disable ID
  dismiss ID | snooze ID [minutes]
  volume 0.0-1.0 | mute | test
  help | quit
  days: once, daily, weekdays, weekends or a list like 1,3,5 or mon,wed (0 = Sunday)";

fn print_event(event: &AlarmEvent) {
    match event {
        AlarmEvent::Fired(notice) => {
            println!(
                "\n*** {} {} ({}){} ***",
                notice.time,
                notice.label,
                notice.repeat,
                if notice.from_snooze { ", snoozed" } else { "" }
            );
            println!(
                "    'dismiss {id}' to stop, 'snooze {id}' for later",
                id = notice.alarm_id
            );
        }
        AlarmEvent::SessionEnded { alarm_id, outcome } => {
            println!("Alarm {} stopped ({:?})", alarm_id, outcome);
        }
        AlarmEvent::Snoozed { alarm_id, fire_at } => {
            let remaining = *fire_at - chrono::Local::now().naive_local();
            println!(
                "Alarm {} snoozed until {} (in {})",
                alarm_id,
                fire_at.format("%H:%M:%S"),
                format_countdown(remaining)
            );
        }
        AlarmEvent::AlarmsChanged(alarms) => {
            if alarms.is_empty() {
                println!("No alarms set");
            }
            for alarm in alarms {
                println!(
                    "{:>3}  {}  {:<3}  {:<20} {:<24} {}{}",
                    alarm.id,
                    alarm.time_label(),
                    if alarm.enabled { "on" } else { "off" },
                    alarm.label,
                    alarm.repeat.description(),
                    alarm.ringtone().name,
                    if alarm.vibrate { ", vibrate" } else { "" }
                );
            }
        }
        AlarmEvent::VolumeChanged { volume, muted } => {
            if *muted {
                println!("Sound muted (volume {:.0}%)", volume * 100.0);
            } else {
                println!("Volume {:.0}%", volume * 100.0);
            }
        }
        AlarmEvent::Error(message) => println!("! {}", message),
    }
}

/// Reads stdin on a plain thread so a pending read never blocks shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

async fn load_settings(db: &Database) -> Settings {
    match db.get_settings().await {
        Ok(settings) => match validate_settings(&settings) {
            Ok(()) => settings,
            Err(e) => {
                warn!("Stored settings rejected ({}), using defaults", e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to load settings ({:#}), using defaults", e);
            Settings::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Logging unavailable: {}", e);
    }

    info!("Starting AlarmChime");

    let path = database_path();
    ensure_parent_directory(&path)?;

    let db = match Database::open(&path).await {
        Ok(database) => database,
        Err(e) => {
            log_error_with_context(&e, "Database");
            eprintln!("Failed to initialize database at {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let settings = load_settings(&db).await;
    let audio = AudioManager::with_default_device(&settings);
    let outputs = SessionOutputs::new(audio, &settings);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let service = AlarmService::load(db, SystemClock, outputs, settings, event_tx).await?;

    let (command_tx, command_rx) = mpsc::channel(32);
    let shutdown = CancellationToken::new();
    let service_task = tokio::spawn(service.run(command_rx, shutdown.clone()));

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            print_event(&event);
        }
    });

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received");
                shutdown.cancel();
            }
        });
    }

    println!("{}", HELP);
    command_tx.send(Command::ListAlarms).await?;

    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => {
                // stdin closed
                let Some(line) = line else { break };
                match line.trim() {
                    "" => continue,
                    "quit" | "exit" => break,
                    "help" => println!("{}", HELP),
                    input => match Command::parse(input) {
                        Ok(command) => {
                            if command_tx.send(command).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => println!("! {}", e.to_safe_string()),
                    },
                }
            }
        }
    }

    // Closing the channel lets the service finish queued commands first
    drop(command_tx);
    if let Err(e) = service_task.await {
        error!("Alarm service task failed: {}", e);
    }
    let _ = printer.await;

    info!("AlarmChime stopped");
    Ok(())
}
