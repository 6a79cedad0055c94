//! Grain-delay pitch shifter.
//!
//! Two delay lines read the same input. Each line's delay is swept by a
//! sawtooth, so its read head moves through the buffer at a different speed
//! than the write head; that speed difference is the pitch ratio. When a
//! ramp resets, its delay jumps, so each line is windowed by a triangle that
//! closes at the jump. The two ramps run half a cycle apart, so one window is
//! fully open whenever the other is closed.
//!
//! # Signal Flow
//!
//! ```text
//!          ┌──────────────────────── × dry (1 − amount) ───────────┐
//!  in ─────┤                                                        ├─→ out
//!          ├─ line A (delay = depth·φ)   × fade A · window(φ)   ─┐ │
//!          └─ line B (delay = depth·φ')  × fade B · window(φ')  ─┴─ × wet (amount)
//! ```
//!
//! For a shift of `st` semitones, `r = 2^(st/12)`, the ramps run at
//! `(1 − r) / T` Hz with `T = 0.1 s` and a full depth of `T`. At `st = 0` the
//! depth glides to zero and the windows flatten to an even 0.5/0.5 split, so
//! the wet path becomes an exact copy of the input.
//!
//! # Parameters
//!
//! | Parameter | Range | Notes |
//! |-----------|-------|-------|
//! | Shift | -12 to +12 semitones | drives ramp rate and depth |
//! | Amount | 0.0 to 1.0 | wet level; dry is `1 − amount` |

use cantor_core::{
    Effect, InterpolatedDelay, Phasor, SmoothedParam, lerp, seconds_to_samples, semitones_to_ratio,
};

/// Grain window length in seconds.
pub const BUFFER_TIME: f32 = 0.1;
/// Capacity of each grain line in seconds.
const LINE_CAPACITY: f32 = 1.0;

/// Triangle window, zero at the ramp reset and one mid-ramp.
#[inline]
fn triangle(phase: f32) -> f32 {
    1.0 - (2.0 * phase - 1.0).abs()
}

#[derive(Debug, Clone)]
struct GrainLine {
    delay: InterpolatedDelay,
    ramp: Phasor,
    fade: SmoothedParam,
}

impl GrainLine {
    fn new(sample_rate: f32, phase: f32) -> Self {
        let mut ramp = Phasor::new(sample_rate);
        ramp.set_phase(phase);
        Self {
            delay: InterpolatedDelay::from_time(sample_rate, LINE_CAPACITY),
            ramp,
            fade: SmoothedParam::automation(0.0, sample_rate),
        }
    }

    /// Write `input`, then read the swept tap scaled by its window and fade.
    #[inline]
    fn process(&mut self, input: f32, rate_hz: f32, depth_samples: f32, openness: f32) -> f32 {
        self.ramp.set_frequency(rate_hz);
        let phase = self.ramp.advance();
        self.delay.write(input);
        let tapped = self.delay.read(depth_samples * phase);
        let window = lerp(0.5, triangle(phase), openness);
        tapped * window * self.fade.advance()
    }
}

/// Pitch shifter with dry/wet blend.
///
/// # Example
///
/// ```rust
/// use cantor_core::Effect;
/// use cantor_effects::PitchShifter;
///
/// let mut shifter = PitchShifter::new(48000.0);
/// shifter.set_shift(12.0, 1.0);
/// let out = shifter.process(0.25);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct PitchShifter {
    lines: [GrainLine; 2],
    dry: SmoothedParam,
    wet: SmoothedParam,
    rate_hz: SmoothedParam,
    depth: SmoothedParam,
    semitones: f32,
    sample_rate: f32,
}

impl PitchShifter {
    /// Fully dry shifter at zero shift.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            lines: [
                GrainLine::new(sample_rate, 0.0),
                GrainLine::new(sample_rate, 0.5),
            ],
            dry: SmoothedParam::automation(1.0, sample_rate),
            wet: SmoothedParam::automation(0.0, sample_rate),
            rate_hz: SmoothedParam::automation(0.0, sample_rate),
            depth: SmoothedParam::automation(0.0, sample_rate),
            semitones: 0.0,
            sample_rate,
        }
    }

    /// Target a shift in semitones with a wet `amount` in `[0, 1]`.
    ///
    /// The grain fades are driven on every call: open whenever `amount > 0`,
    /// closed otherwise, whatever shift was active before.
    pub fn set_shift(&mut self, semitones: f32, amount: f32) {
        self.semitones = semitones;
        self.wet.set_target(amount);
        self.dry.set_target(1.0 - amount);

        if semitones == 0.0 {
            self.rate_hz.set_target(0.0);
            self.depth.set_target(0.0);
        } else {
            let ratio = semitones_to_ratio(semitones);
            self.rate_hz.set_target((1.0 - ratio) / BUFFER_TIME);
            self.depth.set_target(BUFFER_TIME);
        }

        let fade = if amount > 0.0 { 1.0 } else { 0.0 };
        for line in &mut self.lines {
            line.fade.set_target(fade);
        }
    }

    /// Target shift in semitones.
    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Target `(dry, wet, rate_hz, depth_seconds, fade_a, fade_b)`.
    pub fn targets(&self) -> (f32, f32, f32, f32, f32, f32) {
        (
            self.dry.target(),
            self.wet.target(),
            self.rate_hz.target(),
            self.depth.target(),
            self.lines[0].fade.target(),
            self.lines[1].fade.target(),
        )
    }

    /// Jump to the targets. Only before the shifter carries signal.
    pub fn settle(&mut self) {
        self.dry.snap_to_target();
        self.wet.snap_to_target();
        self.rate_hz.snap_to_target();
        self.depth.snap_to_target();
        for line in &mut self.lines {
            line.fade.snap_to_target();
        }
    }
}

impl Effect for PitchShifter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let dry = self.dry.advance();
        let wet = self.wet.advance();
        let rate = self.rate_hz.advance();
        let depth = self.depth.advance();

        let depth_samples = seconds_to_samples(depth, self.sample_rate);
        let openness = (depth / BUFFER_TIME).clamp(0.0, 1.0);

        let [a, b] = &mut self.lines;
        let grains = a.process(input, rate, depth_samples, openness)
            + b.process(input, rate, depth_samples, openness);

        input * dry + grains * wet
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.delay.clear();
        }
    }

    fn latency_samples(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shift_is_transparent_at_any_amount() {
        for amount in [0.0, 0.3, 1.0] {
            let mut shifter = PitchShifter::new(48000.0);
            shifter.set_shift(0.0, amount);
            shifter.settle();
            for i in 0..2000 {
                let x = (i as f32 * 0.05).sin();
                let y = shifter.process(x);
                assert!((y - x).abs() < 1e-5, "amount {amount}: {y} vs {x}");
            }
        }
    }

    #[test]
    fn fades_open_for_nonzero_shift_after_zero_state() {
        let mut shifter = PitchShifter::new(48000.0);
        shifter.set_shift(0.0, 0.0);
        shifter.settle();
        shifter.set_shift(5.0, 0.8);
        let (_, _, _, _, fade_a, fade_b) = shifter.targets();
        assert_eq!((fade_a, fade_b), (1.0, 1.0));
    }

    #[test]
    fn fades_close_when_dry() {
        let mut shifter = PitchShifter::new(48000.0);
        shifter.set_shift(7.0, 1.0);
        shifter.set_shift(7.0, 0.0);
        let (dry, wet, _, _, fade_a, _) = shifter.targets();
        assert_eq!((dry, wet, fade_a), (1.0, 0.0, 0.0));
    }

    #[test]
    fn octave_up_rate() {
        let mut shifter = PitchShifter::new(48000.0);
        shifter.set_shift(12.0, 1.0);
        let (_, _, rate, depth, _, _) = shifter.targets();
        assert!((rate + 10.0).abs() < 1e-4);
        assert_eq!(depth, BUFFER_TIME);
    }

    #[test]
    fn windows_are_complementary() {
        for i in 0..100 {
            let phase = i as f32 / 100.0;
            let sum = triangle(phase) + triangle((phase + 0.5) % 1.0);
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn shifted_output_bounded() {
        let mut shifter = PitchShifter::new(48000.0);
        shifter.set_shift(-12.0, 1.0);
        shifter.settle();
        for i in 0..48000 {
            let y = shifter.process((i as f32 * 0.01).sin());
            assert!(y.abs() <= 1.0 + 1e-4);
        }
    }
}
