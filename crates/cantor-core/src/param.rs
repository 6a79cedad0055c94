//! Parameter automation with exponential-approach smoothing.
//!
//! Every automatable value in the vocal chain (gains, cutoffs, mixes, delay
//! times) is a [`SmoothedParam`]. Control code only ever moves the *target*;
//! the audio path advances the current value once per sample, so a control
//! change can never step the signal.
//!
//! ## Usage
//!
//! ```rust
//! use cantor_core::SmoothedParam;
//!
//! // 100 ms time constant at 48 kHz, starting at unity
//! let mut gain = SmoothedParam::automation(1.0, 48000.0);
//!
//! gain.set_target(0.5);
//! for _ in 0..4800 {
//!     let g = gain.advance();
//!     // Use g for processing...
//!     # let _ = g;
//! }
//! ```

use libm::expf;

/// Default time constant for control automation, in milliseconds.
pub const DEFAULT_TIME_CONSTANT_MS: f32 = 100.0;

/// Distance from the target below which the value snaps.
///
/// Absolute, so the final step is inaudible whatever the parameter's unit.
const SNAP_DISTANCE: f32 = 1e-6;

/// A parameter that exponentially approaches its target.
///
/// The law is the one-pole lowpass `y[n] = y[n-1] + c * (target - y[n-1])`,
/// with `c = 1 - exp(-1 / (tau * sample_rate))`. After one time constant the
/// value has covered ~63.2% of the distance; after five, ~99.3%.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Time constant in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a parameter with smoothing disabled (instant changes).
    ///
    /// Call [`set_sample_rate`](Self::set_sample_rate) and
    /// [`set_smoothing_time_ms`](Self::set_smoothing_time_ms) to enable.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a parameter with full configuration.
    ///
    /// # Arguments
    /// * `initial` - Initial parameter value
    /// * `sample_rate` - Sample rate in Hz
    /// * `smoothing_time_ms` - Time constant in milliseconds
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Create a control-automation parameter with the default 100 ms time
    /// constant.
    pub fn automation(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, DEFAULT_TIME_CONSTANT_MS)
    }

    /// Set the value the parameter will approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set target and current value at once.
    ///
    /// Only for initialization, before the parameter feeds a live signal.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the time constant in milliseconds (0 = instant).
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let distance = self.target - self.current;
        if distance.abs() <= SNAP_DISTANCE {
            self.current = self.target;
            return self.current;
        }
        let next = self.current + self.coeff * distance;
        // Once the step rounds away, close the rest one ulp at a time.
        self.current = if next == self.current {
            ulp_toward(self.current, self.target)
        } else {
            next
        };
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Time constant in milliseconds.
    pub fn smoothing_time_ms(&self) -> f32 {
        self.smoothing_time_ms
    }

    /// True once the value has reached its target exactly.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Skip ahead to the target value.
    ///
    /// Used when a node's state is cleared while it is not producing output.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

/// The neighbouring f32 of `x` in the direction of `target`.
fn ulp_toward(x: f32, target: f32) -> f32 {
    if x == 0.0 {
        let smallest = f32::from_bits(1);
        return if target > 0.0 { smallest } else { -smallest };
    }
    let bits = x.to_bits();
    // Incrementing the bit pattern grows the magnitude for either sign.
    if (target > x) == (x > 0.0) {
        f32::from_bits(bits + 1)
    } else {
        f32::from_bits(bits - 1)
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instant_when_no_smoothing() {
        let mut param = SmoothedParam::new(1.0);
        param.set_target(0.5);
        assert_eq!(param.advance(), 0.5);
    }

    #[test]
    fn reaches_63_percent_after_one_time_constant() {
        let mut param = SmoothedParam::automation(0.0, 48000.0);
        param.set_target(1.0);

        for _ in 0..4800 {
            param.advance();
        }

        let expected = 1.0 - expf(-1.0);
        assert!(
            (param.get() - expected).abs() < 0.01,
            "After one time constant, expected ~{}, got {}",
            expected,
            param.get()
        );
    }

    #[test]
    fn settles_exactly_on_target() {
        let mut param = SmoothedParam::automation(100.0, 48000.0);
        param.set_target(10.0);

        // 20 time constants
        for _ in 0..96_000 {
            param.advance();
        }
        assert!(param.is_settled(), "stalled at {}", param.get());
        assert_eq!(param.get(), 10.0);
    }

    #[test]
    fn first_step_is_small() {
        let mut param = SmoothedParam::automation(0.0, 48000.0);
        param.set_target(1.0);
        let first = param.advance();
        assert!(first > 0.0 && first < 0.001, "step too large: {first}");
    }

    #[test]
    fn set_target_does_not_move_current() {
        let mut param = SmoothedParam::automation(0.25, 48000.0);
        param.set_target(0.75);
        assert_eq!(param.get(), 0.25);
        assert_eq!(param.target(), 0.75);
        assert!(!param.is_settled());
    }

    #[test]
    fn delay_glide_never_jumps_at_the_end() {
        // 0.3 s to 0.5 s of delay, in samples
        let mut param = SmoothedParam::automation(14_400.0, 48000.0);
        param.set_target(24_000.0);
        let first_step = param.coeff * (24_000.0 - 14_400.0);

        let mut prev = param.get();
        let mut prev_step = f32::INFINITY;
        for n in 0..96_000 {
            let value = param.advance();
            let step = value - prev;
            assert!(step >= 0.0, "overshoot at sample {n}");
            assert!(step <= first_step + 0.01, "step {step} at sample {n}");
            // Rounding to the value grid is the only allowed growth.
            assert!(step <= prev_step + 0.005, "step grew to {step} at sample {n}");
            prev_step = step;
            prev = value;
        }
        assert!(prev_step < 0.01, "last step {prev_step}");
        assert_eq!(param.get(), 24_000.0);
    }

    #[test]
    fn glide_toward_negative_target_settles() {
        let mut param = SmoothedParam::automation(0.0, 48000.0);
        param.set_target(-12.0);
        for _ in 0..96_000 {
            param.advance();
        }
        assert!(param.is_settled(), "stalled at {}", param.get());
    }

    #[test]
    fn ulp_toward_moves_one_representable_step() {
        assert!(ulp_toward(1.0, 2.0) > 1.0);
        assert!(ulp_toward(1.0, 0.0) < 1.0);
        assert!(ulp_toward(-1.0, 0.0) > -1.0);
        assert!(ulp_toward(-1.0, -2.0) < -1.0);
        assert!(ulp_toward(0.0, 1.0) > 0.0);
        assert!(ulp_toward(0.0, -1.0) < 0.0);
        assert_eq!(ulp_toward(24_000.0, 0.0), 24_000.0 - 0.001_953_125);
    }

    #[test]
    fn retarget_is_last_write_wins() {
        let mut param = SmoothedParam::automation(0.0, 48000.0);
        param.set_target(1.0);
        param.set_target(-1.0);
        for _ in 0..96_000 {
            param.advance();
        }
        assert_eq!(param.get(), -1.0);
    }
}
