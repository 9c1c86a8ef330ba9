use alarmchime::audio::tone::{PEAK_GAIN, SAMPLE_RATE};
use alarmchime::audio::{AudioManager, ToneBurst, ToneOutput};
use alarmchime::{Oscillator, Ringtone, Settings};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingOutput {
    bursts: Mutex<Vec<ToneBurst>>,
}

impl ToneOutput for RecordingOutput {
    fn play(&self, burst: ToneBurst) -> anyhow::Result<()> {
        self.bursts.lock().unwrap().push(burst);
        Ok(())
    }
}

fn manager() -> (AudioManager, Arc<RecordingOutput>) {
    let output = Arc::new(RecordingOutput::default());
    let manager = AudioManager::new(output.clone(), &Settings::default());
    (manager, output)
}

#[test]
fn test_audio_manager_full_workflow() {
    let (manager, output) = manager();

    // Test initial state
    assert_eq!(manager.get_volume(), 0.7);

    // Test volume boundaries
    assert_eq!(manager.set_volume(1.2), 1.0);
    assert_eq!(manager.set_volume(-0.1), 0.0);
    manager.set_volume(0.5);

    for ringtone in Ringtone::catalog() {
        manager.play_burst(ringtone).unwrap();
    }
    manager.test_audio().unwrap();

    let bursts = output.bursts.lock().unwrap();
    assert_eq!(bursts.len(), Ringtone::catalog().len() + 1);
    assert!(bursts.iter().all(|b| (b.peak() - 0.5 * PEAK_GAIN).abs() < 1e-6));
    assert_eq!(bursts[2].oscillator(), Oscillator::Square);
    assert_eq!(bursts[5].frequency(), Ringtone::default_ringtone().frequency);
}

#[test]
fn test_muted_bursts_are_silent() {
    let (manager, output) = manager();
    manager.set_muted(true);
    manager.play_burst(Ringtone::lookup("Classic Bell")).unwrap();

    let burst = output.bursts.lock().unwrap().pop().unwrap();
    assert!(burst.is_silent());
    assert!(burst.into_iter().all(|s| s == 0.0));
}

#[test]
fn test_burst_envelope_shape() {
    let burst = ToneBurst::new(Ringtone::lookup("Gentle Chime"), 1.0, Duration::from_millis(800));
    let attack_end = u64::from(SAMPLE_RATE) / 10;

    assert_eq!(burst.envelope(0), 0.0);
    assert!((burst.envelope(attack_end) - PEAK_GAIN).abs() < 1e-3);
    assert_eq!(burst.envelope(u64::from(SAMPLE_RATE)), 0.0);

    let samples: Vec<f32> = burst.collect();
    assert_eq!(samples.len(), (SAMPLE_RATE as usize) * 8 / 10);
    assert!(samples.iter().all(|s| s.abs() <= PEAK_GAIN + 1e-6));
    assert!(samples.last().unwrap().abs() < 1e-3);
}

#[test]
fn test_unknown_ringtone_falls_back() {
    assert_eq!(Ringtone::lookup("Air Horn").name, "Energetic Beep");
    assert!(!Ringtone::exists("Air Horn"));
}
