//! Integration tests running the vocal stages as the engine chains them.

use cantor_analysis::{peak_frequency, zero_lag_correlation};
use cantor_core::{Effect, StereoSend};
use cantor_effects::{
    Compressor, ConvolutionReverb, FeedbackDelay, GainStage, HaasWidener, HighPass, PitchShifter,
    ToneStack,
};
use proptest::prelude::*;
use std::f32::consts::PI;

const SR: f32 = 48000.0;

fn sine(freq: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.5 * (2.0 * PI * freq * n as f32 / SR).sin())
        .collect()
}

fn shifted(semitones: f32, input_hz: f32) -> f32 {
    let mut shifter = PitchShifter::new(SR);
    shifter.set_shift(semitones, 1.0);
    shifter.settle();

    let input = sine(input_hz, 48000);
    let mut output = vec![0.0; input.len()];
    shifter.process_block(&input, &mut output);

    // skip the first grain cycle
    peak_frequency(&output[16384..], SR, 16384)
}

#[test]
fn octave_up_doubles_frequency() {
    let peak = shifted(12.0, 440.0);
    assert!((peak - 880.0).abs() < 8.8, "peak at {peak} Hz");
}

#[test]
fn octave_down_halves_frequency() {
    let peak = shifted(-12.0, 440.0);
    assert!((peak - 220.0).abs() < 2.2, "peak at {peak} Hz");
}

#[test]
fn neutral_chain_is_transparent() {
    let mut gain = GainStage::new(SR);
    let mut highpass = HighPass::new(SR);
    let mut shifter = PitchShifter::new(SR);
    let mut tone = ToneStack::new(SR);
    gain.settle();
    highpass.settle();
    shifter.settle();
    tone.settle();

    let input = sine(1000.0, 4800);
    let mut peak_in = 0.0f32;
    let mut peak_out = 0.0f32;
    for (i, &x) in input.iter().enumerate() {
        let y = tone.process(shifter.process(highpass.process(gain.process(x))));
        if i > 2400 {
            peak_in = peak_in.max(x.abs());
            peak_out = peak_out.max(y.abs());
        }
    }
    assert!((peak_out - peak_in).abs() < 0.01 * peak_in, "{peak_in} vs {peak_out}");
}

#[test]
fn compressor_tames_loud_input() {
    let mut comp = Compressor::new(SR);
    comp.set_threshold_db(-30.0);
    comp.set_ratio(8.0);
    comp.settle();

    let input = sine(200.0, 24000);
    let mut peak_out = 0.0f32;
    for (i, &x) in input.iter().enumerate() {
        let y = comp.process(x);
        if i > 12000 {
            peak_out = peak_out.max(y.abs());
        }
    }
    assert!(peak_out < 0.25, "peak {peak_out}");
    assert!(comp.gain_reduction_db() < -6.0);
}

#[test]
fn widener_decorrelates_channels() {
    let mut widener = HaasWidener::new(SR);
    widener.set_enabled(true);
    widener.settle();

    let mut seed = 11u32;
    let (mut left, mut right) = (Vec::new(), Vec::new());
    for _ in 0..48000 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let x = (seed >> 8) as f32 / (1u32 << 24) as f32 - 0.5;
        let (l, r) = widener.process_send(x);
        left.push(l);
        right.push(r);
    }
    let rho = zero_lag_correlation(&left[4800..], &right[4800..]);
    assert!(rho.abs() < 0.2, "correlation {rho}");
}

#[test]
fn sends_are_silent_at_zero_mix() {
    let mut reverb = ConvolutionReverb::new(SR);
    let mut echo = FeedbackDelay::new(SR);
    reverb.set_mix(0.0);
    echo.set_mix(0.0);
    reverb.settle();
    echo.settle();

    for &x in &sine(300.0, 4800) {
        assert_eq!(reverb.process_send(x), (0.0, 0.0));
        assert_eq!(echo.process_send(x), (0.0, 0.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Dry and wet always sum to one and the grain windows are
    /// complementary, so the shifter never exceeds its input peak.
    #[test]
    fn shifter_output_bounded(
        semitones in -12.0f32..12.0,
        amount in 0.0f32..=1.0,
        input in prop::collection::vec(-1.0f32..=1.0, 256..2048),
    ) {
        let mut shifter = PitchShifter::new(SR);
        shifter.set_shift(semitones, amount);
        for &x in &input {
            let y = shifter.process(x);
            prop_assert!(y.is_finite());
            prop_assert!(y.abs() <= 1.001, "output {y}");
        }
    }

    /// Feedback below one keeps the echo finite for bounded input.
    #[test]
    fn echo_stays_finite(
        time in 0.001f32..1.0,
        feedback in 0.0f32..0.95,
        mix in 0.0f32..=1.0,
    ) {
        let mut echo = FeedbackDelay::new(SR);
        echo.set_time(time);
        echo.set_feedback(feedback);
        echo.set_mix(mix);
        echo.settle();
        for n in 0..9600 {
            let x = if n % 480 == 0 { 1.0 } else { 0.0 };
            let (l, r) = echo.process_send(x);
            prop_assert!(l.is_finite() && l == r);
            prop_assert!(l.abs() <= 1.0 / (1.0 - feedback) + 1e-3);
        }
    }
}
