//! Property tests for the graph under arbitrary in-range snapshots, and
//! file round trips through the engine.

use cantor_engine::{Engine, EngineConfig, FileRole, Settings, VocalGraph};
use cantor_io::OfflineBackend;
use proptest::prelude::*;
use std::time::Duration;

const SR: f32 = 48000.0;

fn settings_strategy() -> impl Strategy<Value = Settings> {
    (
        (-12.0f32..=12.0, any::<bool>(), 0.0f32..=1.0, -12.0f32..=12.0),
        (-15.0f32..=15.0, -15.0f32..=15.0, -15.0f32..=15.0, any::<bool>()),
        (-60.0f32..=0.0, 1.0f32..=20.0, 0.0f32..=1.0),
        (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=0.9, any::<bool>(), 0.0f32..=1.5),
    )
        .prop_map(
            |(
                (input_gain, high_pass, autotune_amount, pitch_shift),
                (low_gain, mid_gain, high_gain, air_mode),
                (compressor_threshold, compressor_ratio, reverb_mix),
                (delay_mix, delay_time, delay_feedback, spatial_3d, output_gain),
            )| Settings {
                input_gain,
                high_pass,
                autotune_amount,
                pitch_shift,
                low_gain,
                mid_gain,
                high_gain,
                air_mode,
                compressor_threshold,
                compressor_ratio,
                reverb_mix,
                delay_mix,
                delay_time,
                delay_feedback,
                spatial_3d,
                output_gain,
                ..Settings::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any documented snapshot keeps the bus finite for full-scale input,
    /// including a switch between two snapshots mid-stream.
    #[test]
    fn graph_output_stays_finite(
        first in settings_strategy(),
        second in settings_strategy(),
        input in prop::collection::vec(-1.0f32..=1.0, 2048..4096),
    ) {
        let mut graph = VocalGraph::new(SR);
        graph.apply(&first);
        graph.set_monitor(true);
        graph.settle();

        let switch = input.len() / 2;
        for (n, &x) in input.iter().enumerate() {
            if n == switch {
                graph.apply(&second);
            }
            let frame = graph.process(x, (0.0, 0.0));
            prop_assert!(frame.mix.0.is_finite() && frame.mix.1.is_finite());
            prop_assert!(frame.output.0.is_finite() && frame.output.1.is_finite());
        }
    }

    /// The targets after an application depend only on that snapshot.
    #[test]
    fn targets_depend_only_on_last_snapshot(
        first in settings_strategy(),
        second in settings_strategy(),
    ) {
        let mut graph = VocalGraph::new(SR);
        graph.apply(&first);
        graph.apply(&second);

        let mut fresh = VocalGraph::new(SR);
        fresh.apply(&second);
        prop_assert_eq!(graph.targets(), fresh.targets());
    }
}

#[test]
fn loaded_file_renders_and_recording_saves() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("vocal.wav");
    let tone: Vec<f32> = (0..9600)
        .flat_map(|n| {
            let s = (n as f32 * 0.05).sin() * 0.3;
            [s, s]
        })
        .collect();
    cantor_io::write_wav(&input, &tone, 2, 48000).unwrap();

    let (backend, driver) = OfflineBackend::new();
    let mut engine = Engine::new(Box::new(backend), EngineConfig::default());
    engine.load_file(FileRole::Vocal, &input).unwrap();
    engine.start_recording().unwrap();
    engine.play_vocal(false).unwrap();
    for _ in 0..20 {
        driver.render(128);
    }
    engine.stop_recording();

    let recording = engine.wait_for_recording(Duration::from_secs(10)).unwrap();
    let output = dir.path().join("take.wav");
    recording.save(&output).unwrap();

    let info = cantor_io::read_wav_info(&output).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 48000);
    assert_eq!(info.num_frames, 20 * 128);
}

#[test]
fn missing_file_is_a_decode_error() {
    let (backend, _driver) = OfflineBackend::new();
    let mut engine = Engine::new(Box::new(backend), EngineConfig::default());
    let err = engine
        .load_file(FileRole::Backing, "/nonexistent/backing.mp3")
        .unwrap_err();
    assert!(matches!(err, cantor_engine::EngineError::Decode(_)));
    assert!(!engine.has_buffer(FileRole::Backing));
}
