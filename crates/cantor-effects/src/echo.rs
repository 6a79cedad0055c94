//! Feedback echo send.

use cantor_core::{InterpolatedDelay, SmoothedParam, StereoSend, flush_denormal};

/// Capacity of the echo line in seconds.
pub const MAX_ECHO_SECONDS: f32 = 2.0;
/// Stability limit for feedback; the loop is unstable at 1. Settings stay
/// within 0–0.9.
pub const MAX_FEEDBACK: f32 = 0.99;

/// Single delay line whose output feeds back into its own input.
///
/// ```text
/// in ──(+)──→ [delay] ──┬──→ × mix ──→ (L, R)
///       ↑               │
///       └── × feedback ─┘
/// ```
///
/// An impulse produces echoes at every multiple of the delay time, each one
/// `feedback` times the previous.
///
/// | Parameter | Range | Default |
/// |-----------|-------|---------|
/// | Time | 0–1 s (min 1 sample) | 0.3 s |
/// | Feedback | 0–0.9 (clamped at [`MAX_FEEDBACK`]) | 0.3 |
/// | Mix | 0–1 | 0 |
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    line: InterpolatedDelay,
    delay_samples: SmoothedParam,
    feedback: SmoothedParam,
    mix: SmoothedParam,
    sample_rate: f32,
}

impl FeedbackDelay {
    /// Echo send at 0.3 s, feedback 0.3, mix 0.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: InterpolatedDelay::from_time(sample_rate, MAX_ECHO_SECONDS),
            delay_samples: SmoothedParam::automation(0.3 * sample_rate, sample_rate),
            feedback: SmoothedParam::automation(0.3, sample_rate),
            mix: SmoothedParam::automation(0.0, sample_rate),
            sample_rate,
        }
    }

    /// Target delay time in seconds.
    pub fn set_time(&mut self, seconds: f32) {
        let samples = (seconds * self.sample_rate).clamp(1.0, self.line.max_delay() + 1.0);
        self.delay_samples.set_target(samples);
    }

    /// Target feedback gain.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback.set_target(feedback.clamp(0.0, MAX_FEEDBACK));
    }

    /// Target send level.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix.set_target(mix);
    }

    /// Target `(time_seconds, feedback, mix)`.
    pub fn targets(&self) -> (f32, f32, f32) {
        (
            self.delay_samples.target() / self.sample_rate,
            self.feedback.target(),
            self.mix.target(),
        )
    }

    /// Jump to the targets. Only before the send carries signal.
    pub fn settle(&mut self) {
        self.delay_samples.snap_to_target();
        self.feedback.snap_to_target();
        self.mix.snap_to_target();
    }
}

impl StereoSend for FeedbackDelay {
    #[inline]
    fn process_send(&mut self, input: f32) -> (f32, f32) {
        let delay = self.delay_samples.advance();
        let feedback = self.feedback.advance();
        let mix = self.mix.advance();

        // Read before write: a tap at `delay - 1` is exactly `delay` samples old.
        let delayed = self.line.read(delay - 1.0);
        self.line.write(flush_denormal(input + delayed * feedback));

        let out = delayed * mix;
        (out, out)
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_decay_by_feedback() {
        let mut echo = FeedbackDelay::new(1000.0);
        echo.set_time(0.1);
        echo.set_feedback(0.5);
        echo.set_mix(1.0);
        echo.settle();

        let out: Vec<f32> = (0..450)
            .map(|i| echo.process_send(if i == 0 { 1.0 } else { 0.0 }).0)
            .collect();

        assert_eq!(out[0], 0.0);
        assert!((out[100] - 1.0).abs() < 1e-6);
        assert!((out[200] - 0.5).abs() < 1e-6);
        assert!((out[300] - 0.25).abs() < 1e-6);
        let stray: f32 = out
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 100 != 0)
            .map(|(_, s)| s.abs())
            .sum();
        assert!(stray < 1e-6);
    }

    #[test]
    fn feedback_clamped_below_unity() {
        let mut echo = FeedbackDelay::new(48000.0);
        echo.set_feedback(1.5);
        assert_eq!(echo.targets().1, MAX_FEEDBACK);
    }

    #[test]
    fn settings_range_passes_unclamped() {
        let mut echo = FeedbackDelay::new(48000.0);
        echo.set_feedback(0.9);
        assert_eq!(echo.targets().1, 0.9);
        assert!(MAX_FEEDBACK > 0.9 && MAX_FEEDBACK < 1.0);
    }

    #[test]
    fn zero_time_is_one_sample() {
        let mut echo = FeedbackDelay::new(48000.0);
        echo.set_time(0.0);
        echo.set_mix(1.0);
        echo.settle();
        assert_eq!(echo.process_send(1.0).0, 0.0);
        assert_eq!(echo.process_send(0.0).0, 1.0);
    }
}
