//! The "alarm is currently announcing" session.
//!
//! A session owns three timer tasks: the repeating audio burst, the
//! self-rescheduling haptic chain and the visual animation. All of them hold
//! a child of the session's cancellation token and check it before every
//! re-arm. Ending or dropping the session cancels the token and aborts the
//! tasks, so no new burst or pulse starts after dismissal. A burst already
//! handed to the audio device finishes its own short duration.

use crate::audio::AudioManager;
use crate::feedback::{
    bar_levels, Haptics, NoHaptics, NoVisualizer, Visualizer, VIBRATION_PATTERN,
};
use crate::models::{Alarm, AlarmId, Ringtone, SessionOutcome, Settings};
use log::{debug, info, trace};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Everything a session emits to.
#[derive(Clone)]
pub struct SessionOutputs {
    pub audio: AudioManager,
    pub haptics: Arc<dyn Haptics>,
    pub visualizer: Arc<dyn Visualizer>,
    pub burst_interval: Duration,
    pub vibration_period: Duration,
    pub frame_interval: Duration,
}

impl SessionOutputs {
    pub fn new(audio: AudioManager, settings: &Settings) -> Self {
        Self {
            audio,
            haptics: Arc::new(NoHaptics),
            visualizer: Arc::new(NoVisualizer),
            burst_interval: settings.burst_interval(),
            vibration_period: settings.vibration_period(),
            frame_interval: FRAME_INTERVAL,
        }
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn Haptics>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn with_visualizer(mut self, visualizer: Arc<dyn Visualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }
}

pub struct NotificationSession {
    id: Uuid,
    alarm_id: AlarmId,
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    haptics: Arc<dyn Haptics>,
    visualizer: Arc<dyn Visualizer>,
    started: Instant,
}

impl NotificationSession {
    /// Enters the announcing state for `alarm`. Must run inside a tokio runtime.
    pub fn start(alarm: &Alarm, outputs: &SessionOutputs) -> Self {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        let ringtone = alarm.ringtone();

        info!(
            "Session {} announcing alarm {} '{}' with {}",
            id, alarm.id, alarm.label, ringtone.name
        );

        let mut tasks = vec![tokio::spawn(audio_loop(
            outputs.audio.clone(),
            ringtone,
            outputs.burst_interval,
            token.child_token(),
        ))];
        if alarm.vibrate {
            tasks.push(tokio::spawn(haptic_chain(
                outputs.haptics.clone(),
                outputs.vibration_period,
                token.child_token(),
            )));
        }
        tasks.push(tokio::spawn(animation_loop(
            outputs.visualizer.clone(),
            outputs.frame_interval,
            token.child_token(),
        )));

        Self {
            id,
            alarm_id: alarm.id,
            token,
            tasks,
            haptics: outputs.haptics.clone(),
            visualizer: outputs.visualizer.clone(),
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn alarm_id(&self) -> AlarmId {
        self.alarm_id
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Number of timer tasks owned by the session.
    pub fn timer_count(&self) -> usize {
        self.tasks.len()
    }

    /// Leaves the announcing state, stopping every timer.
    pub fn end(mut self, outcome: SessionOutcome) {
        self.teardown();
        info!(
            "Session {} for alarm {} ended ({:?}) after {:.1}s",
            self.id,
            self.alarm_id,
            outcome,
            self.started.elapsed().as_secs_f32()
        );
    }

    fn teardown(&mut self) {
        if self.token.is_cancelled() {
            return;
        }
        self.token.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.haptics.stop();
        self.visualizer.clear();
    }
}

impl Drop for NotificationSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn audio_loop(
    audio: AudioManager,
    ringtone: &'static Ringtone,
    every: Duration,
    token: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if token.is_cancelled() {
                    break;
                }
                // no audio is not fatal to alarm delivery
                if let Err(e) = audio.play_burst(ringtone) {
                    debug!("Alarm burst skipped: {}", e);
                }
            }
        }
    }
    trace!("Audio loop stopped");
}

async fn haptic_chain(haptics: Arc<dyn Haptics>, period: Duration, token: CancellationToken) {
    loop {
        // check liveness before every re-arm
        if token.is_cancelled() {
            break;
        }
        if let Err(e) = haptics.vibrate(&VIBRATION_PATTERN) {
            debug!("Vibration skipped: {}", e);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = sleep(period) => {}
        }
    }
    trace!("Haptic chain stopped");
}

async fn animation_loop(
    visualizer: Arc<dyn Visualizer>,
    every: Duration,
    token: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                visualizer.draw(&bar_levels(frame));
                frame = frame.wrapping_add(1);
            }
        }
    }
}
