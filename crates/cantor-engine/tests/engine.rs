//! Engine behavior driven block by block through the offline backend.

use cantor_engine::{
    ActiveSource, Engine, EngineConfig, EngineError, FileRole, LatencyMode, PlaybackOptions,
    ProfileHandle, Settings, SpectralFingerprint,
};
use cantor_io::{DecodedBuffer, OfflineBackend, OfflineDriver};
use std::time::{Duration, Instant};

const SR: u32 = 48000;
const BLOCK: usize = 128;

fn engine() -> (Engine, OfflineDriver) {
    let (backend, driver) = OfflineBackend::new();
    (Engine::new(Box::new(backend), EngineConfig::default()), driver)
}

fn sine(freq: f32, seconds: f32, amplitude: f32) -> Vec<f32> {
    let len = (seconds * SR as f32) as usize;
    (0..len)
        .map(|n| (std::f32::consts::TAU * freq * n as f32 / SR as f32).sin() * amplitude)
        .collect()
}

fn render_seconds(driver: &OfflineDriver, seconds: f32) -> Vec<f32> {
    let blocks = (seconds * SR as f32 / BLOCK as f32).ceil() as usize;
    let mut out = Vec::new();
    for _ in 0..blocks {
        out.extend(driver.render(BLOCK));
    }
    out
}

/// Keep audio flowing until the profile resolves.
fn drive_profile(driver: &OfflineDriver, handle: ProfileHandle) -> SpectralFingerprint {
    let deadline = Instant::now() + Duration::from_secs(20);
    while !handle.is_finished() && Instant::now() < deadline {
        driver.render(BLOCK);
        std::thread::sleep(Duration::from_millis(1));
    }
    handle.wait()
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

#[test]
fn nothing_opens_before_first_use() {
    let (mut engine, driver) = engine();
    engine.apply_settings(&Settings::default());
    engine.set_monitor(true);
    engine.stop(FileRole::Vocal);
    assert!(!engine.is_built());
    assert!(!driver.has_output());

    engine.init().unwrap();
    assert!(engine.is_built());
    assert_eq!(driver.output_config().unwrap().buffer_size, 128);
}

#[test]
fn applied_snapshot_is_a_copy() {
    let (mut engine, _driver) = engine();
    let mut settings = Settings {
        reverb_mix: 0.4,
        ..Settings::default()
    };
    engine.apply_settings(&settings);
    settings.reverb_mix = 0.9;
    assert_eq!(engine.settings().reverb_mix, 0.4);
}

#[test]
fn latency_round_trip_restores_settings_exactly() {
    let (mut engine, driver) = engine();
    let settings = Settings {
        input_gain: 3.5,
        pitch_shift: -7.0,
        autotune_amount: 0.35,
        delay_time: 0.41,
        spatial_3d: true,
        ..Settings::default()
    };
    engine.apply_settings(&settings);
    engine.init().unwrap();

    engine.set_latency_mode(LatencyMode::Balanced).unwrap();
    assert_eq!(engine.latency_mode(), LatencyMode::Balanced);
    assert_eq!(driver.output_config().unwrap().buffer_size, 1024);

    engine.set_latency_mode(LatencyMode::Interactive).unwrap();
    assert_eq!(driver.output_config().unwrap().buffer_size, 128);
    assert_eq!(engine.settings(), &settings);
    let bits = |s: &Settings| s.numeric_values().map(f32::to_bits);
    assert_eq!(bits(engine.settings()), bits(&settings));
}

#[test]
fn microphone_is_requested_raw() {
    let (mut engine, driver) = engine();
    engine.use_microphone(true).unwrap();

    let requests = driver.input_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].processing.is_raw());
    assert_eq!(engine.input_source(), ActiveSource::Microphone);
    assert!(engine.is_monitoring());
}

#[test]
fn monitored_microphone_reaches_the_output() {
    let (mut engine, driver) = engine();
    engine.use_microphone(true).unwrap();

    let tone = sine(440.0, 1.0, 0.3);
    let mut last = Vec::new();
    for chunk in tone.chunks(BLOCK) {
        driver.feed_input(chunk);
        last = driver.render(BLOCK);
    }
    assert!(peak(&last) > 0.02, "peak {}", peak(&last));
}

#[test]
fn unmonitored_microphone_is_silent_at_the_output() {
    let (mut engine, driver) = engine();
    engine.use_microphone(false).unwrap();
    let tone = sine(440.0, 0.5, 0.3);
    let mut out = Vec::new();
    for chunk in tone.chunks(BLOCK) {
        driver.feed_input(chunk);
        out.extend(driver.render(BLOCK));
    }
    assert_eq!(peak(&out), 0.0);
}

#[test]
fn failed_acquisition_leaves_the_source_alone() {
    let (mut engine, driver) = engine();
    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&sine(220.0, 2.0, 0.3), SR));
    engine.play_vocal(true).unwrap();

    driver.fail_input(Some("permission denied"));
    let err = engine.use_microphone(true).unwrap_err();
    assert!(matches!(err, EngineError::Acquisition(_)), "{err:?}");
    assert_eq!(engine.input_source(), ActiveSource::VocalTrack);
    assert!(engine.is_monitoring());
}

#[test]
fn vocal_playback_releases_the_microphone() {
    let (mut engine, driver) = engine();
    engine.use_microphone(true).unwrap();
    assert!(driver.has_input());

    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&sine(220.0, 1.0, 0.3), SR));
    engine.play_vocal(false).unwrap();
    assert!(!driver.has_input());
    assert_eq!(engine.input_source(), ActiveSource::VocalTrack);
    assert!(!engine.is_monitoring());
}

#[test]
fn failed_rebuild_keeps_the_previous_mode() {
    let (mut engine, driver) = engine();
    engine.init().unwrap();

    driver.fail_output(Some("device busy"));
    let err = engine.set_latency_mode(LatencyMode::Balanced).unwrap_err();
    assert!(
        matches!(
            err,
            EngineError::Rebuild {
                mode: LatencyMode::Balanced,
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(engine.latency_mode(), LatencyMode::Interactive);
    assert!(!engine.is_built());

    driver.fail_output(None);
    engine.init().unwrap();
    assert_eq!(driver.output_config().unwrap().buffer_size, 128);
}

#[test]
fn latency_switch_reacquires_microphone_with_monitor_state() {
    let (mut engine, driver) = engine();
    engine.use_microphone(true).unwrap();

    engine.set_latency_mode(LatencyMode::Balanced).unwrap();
    assert_eq!(engine.input_source(), ActiveSource::Microphone);
    assert!(engine.is_monitoring());
    assert!(driver.has_input());
    let requests = driver.input_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].buffer_size, 1024);
    assert!(requests[1].processing.is_raw());
}

#[test]
fn latency_switch_does_not_resume_files() {
    let (mut engine, _driver) = engine();
    let tone = DecodedBuffer::from_mono(&sine(220.0, 2.0, 0.3), SR);
    engine.set_buffer(FileRole::Vocal, tone.clone());
    engine.set_buffer(FileRole::Backing, tone);
    engine.play_vocal(true).unwrap();
    engine.play_backing(true).unwrap();

    engine.set_latency_mode(LatencyMode::Balanced).unwrap();
    assert_eq!(engine.input_source(), ActiveSource::None);
    assert_eq!(engine.bypass_source(), ActiveSource::None);
    assert!(!engine.is_monitoring());
    assert!(engine.has_buffer(FileRole::Vocal));
}

#[test]
fn recording_exists_only_after_stop_and_is_not_empty() {
    let (mut engine, driver) = engine();
    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&sine(330.0, 1.0, 0.3), SR));
    engine.start_recording().unwrap();
    engine.play_vocal(false).unwrap();

    for _ in 0..10 {
        driver.render(BLOCK);
    }
    assert!(engine.recording().is_none());

    engine.stop_recording();
    let recording = engine.wait_for_recording(Duration::from_secs(10)).unwrap();
    assert_eq!(recording.frames(), 10 * BLOCK);
    assert!(recording.len() > 44);
    assert_eq!(recording.sample_rate(), SR);
}

#[test]
fn recording_start_and_stop_are_idempotent() {
    let (mut engine, driver) = engine();
    engine.start_recording().unwrap();
    engine.start_recording().unwrap();
    assert!(engine.is_recording());
    driver.render(BLOCK);

    engine.stop_recording();
    engine.stop_recording();
    assert!(!engine.is_recording());
    let recording = engine.wait_for_recording(Duration::from_secs(10)).unwrap();
    assert_eq!(recording.frames(), BLOCK);
}

#[test]
fn teardown_finalizes_an_active_recording() {
    let (mut engine, driver) = engine();
    engine.start_recording().unwrap();
    driver.render(BLOCK);
    engine.teardown();
    assert!(!engine.is_recording());
    assert!(engine.wait_for_recording(Duration::from_secs(10)).is_some());
}

#[test]
fn impulse_yields_direct_sound_and_decaying_echoes() {
    let (mut engine, driver) = engine();
    let mut impulse = vec![0.0f32; SR as usize];
    impulse[0] = 1.0;
    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&impulse, SR));
    engine.apply_settings(&Settings {
        input_gain: 0.0,
        low_gain: 0.0,
        mid_gain: 0.0,
        high_gain: 0.0,
        compressor_threshold: -24.0,
        compressor_ratio: 4.0,
        reverb_mix: 0.1,
        delay_mix: 0.2,
        delay_time: 0.3,
        delay_feedback: 0.3,
        output_gain: 1.0,
        ..Settings::default()
    });

    engine.start_recording().unwrap();
    engine.play_vocal(false).unwrap();
    render_seconds(&driver, 0.7);
    engine.stop_recording();

    let recording = engine.wait_for_recording(Duration::from_secs(10)).unwrap();
    let mix =
        cantor_io::decode_bytes(recording.bytes().to_vec(), Some("wav"), SR).unwrap();
    let echo = (0.3 * SR as f32) as usize;
    assert!((mix.frame(0).0 - 1.0).abs() < 0.01, "direct {:?}", mix.frame(0));
    assert!((mix.frame(echo).0 - 0.2).abs() < 0.01, "echo {:?}", mix.frame(echo));
    assert!(
        (mix.frame(2 * echo).0 - 0.06).abs() < 0.005,
        "second echo {:?}",
        mix.frame(2 * echo)
    );
}

#[test]
fn finished_vocal_empties_the_input_slot() {
    let (mut engine, driver) = engine();
    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&[0.1; 300], SR));
    engine.play_vocal(false).unwrap();
    assert_eq!(engine.input_source(), ActiveSource::VocalTrack);

    for _ in 0..4 {
        driver.render(BLOCK);
    }
    assert_eq!(engine.input_source(), ActiveSource::None);
    // Stopping what already ended is a no-op.
    engine.stop(FileRole::Vocal);
}

#[test]
fn backing_loops_only_when_asked() {
    let (mut engine, driver) = engine();
    engine.set_buffer(FileRole::Backing, DecodedBuffer::from_mono(&[0.2; 100], SR));

    engine.play_backing(true).unwrap();
    for _ in 0..4 {
        driver.render(BLOCK);
    }
    assert_eq!(engine.bypass_source(), ActiveSource::BackingTrack);
    let block = driver.render(BLOCK);
    assert!(block.iter().all(|&s| (s - 0.2).abs() < 1e-6));

    engine.play_backing(false).unwrap();
    for _ in 0..4 {
        driver.render(BLOCK);
    }
    assert_eq!(engine.bypass_source(), ActiveSource::None);
}

#[test]
fn backing_and_vocal_use_separate_slots() {
    let (mut engine, _driver) = engine();
    let tone = DecodedBuffer::from_mono(&sine(220.0, 1.0, 0.3), SR);
    engine.set_buffer(FileRole::Backing, tone.clone());
    engine.set_buffer(FileRole::Vocal, tone);

    engine
        .use_file(FileRole::Backing, PlaybackOptions::default())
        .unwrap();
    engine.play_vocal(true).unwrap();
    assert_eq!(engine.bypass_source(), ActiveSource::BackingTrack);
    assert_eq!(engine.input_source(), ActiveSource::VocalTrack);

    engine.stop(FileRole::Backing);
    engine.stop(FileRole::Backing);
    assert_eq!(engine.bypass_source(), ActiveSource::None);
    assert_eq!(engine.input_source(), ActiveSource::VocalTrack);
}

#[test]
fn playing_with_nothing_loaded_does_nothing() {
    let (mut engine, driver) = engine();
    engine.play_vocal(true).unwrap();
    engine.play_backing(true).unwrap();
    assert!(!engine.is_built());
    assert!(!driver.has_output());
}

#[test]
fn decode_failure_keeps_the_previous_buffer() {
    let (mut engine, _driver) = engine();
    let wav = cantor_io::encode_wav(&[0.25; 256], 2, SR).unwrap();
    engine.load_bytes(FileRole::Vocal, wav, Some("wav")).unwrap();

    let err = engine
        .load_bytes(FileRole::Vocal, b"definitely not audio".to_vec(), Some("wav"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Decode(_)), "{err:?}");
    assert!(engine.has_buffer(FileRole::Vocal));
    assert!(!engine.has_buffer(FileRole::Backing));
}

#[test]
fn monitor_delay_is_clamped_and_survives_rebuild() {
    let (mut engine, _driver) = engine();
    engine.set_monitor_delay(0.5);
    assert_eq!(engine.monitor_delay(), 0.2);
    engine.init().unwrap();
    engine.set_latency_mode(LatencyMode::Balanced).unwrap();
    assert_eq!(engine.monitor_delay(), 0.2);
}

#[test]
fn silence_profiles_to_zero() {
    let (mut engine, driver) = engine();
    engine.init().unwrap();
    let fingerprint = drive_profile(&driver, engine.profile(Duration::from_millis(500)));
    assert!(fingerprint.rms < 1e-3, "{fingerprint:?}");
    assert!(fingerprint.low < 1e-3 && fingerprint.mid < 1e-3 && fingerprint.high < 1e-3);
}

#[test]
fn tone_profile_lands_in_the_mid_band() {
    let (mut engine, driver) = engine();
    engine.apply_settings(&Settings {
        reverb_mix: 0.0,
        delay_mix: 0.0,
        ..Settings::default()
    });
    engine.set_buffer(FileRole::Vocal, DecodedBuffer::from_mono(&sine(1000.0, 1.0, 0.5), SR));
    engine
        .use_file(
            FileRole::Vocal,
            PlaybackOptions {
                looping: true,
                monitor: false,
            },
        )
        .unwrap();

    let fingerprint = drive_profile(&driver, engine.profile(Duration::from_millis(300)));
    assert!(fingerprint.rms > 0.0, "{fingerprint:?}");
    assert!(fingerprint.mid > fingerprint.low, "{fingerprint:?}");
}

#[test]
fn profiling_an_unbuilt_engine_resolves_zero() {
    let (engine, _driver) = engine();
    assert_eq!(
        engine.profile(Duration::from_secs(3)).wait(),
        SpectralFingerprint::ZERO
    );
}

#[test]
fn teardown_mid_profile_resolves_zero() {
    let (mut engine, driver) = engine();
    engine.init().unwrap();
    let handle = engine.profile(Duration::from_secs(30));
    driver.render(BLOCK);
    engine.teardown();

    let start = Instant::now();
    assert_eq!(handle.wait(), SpectralFingerprint::ZERO);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn engine_moves_across_threads() {
    fn assert_send<T: Send>() {}
    assert_send::<Engine>();
}
