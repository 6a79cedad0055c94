//! Bidirectional sawtooth phasor.
//!
//! The pitch shifter sweeps each grain line's delay with a ramp running at
//! `(1 - ratio) / window` Hz. Upward shifts give a negative frequency, so the
//! phasor must ramp in both directions and wrap cleanly either way.

use libm::floorf;

/// Phase accumulator in `[0, 1)` with signed frequency.
///
/// # Example
///
/// ```rust
/// use cantor_core::Phasor;
///
/// let mut ramp = Phasor::new(48000.0);
/// ramp.set_frequency(-10.0); // falling ramp, 10 cycles per second
/// let phase = ramp.advance();
/// assert!((0.0..1.0).contains(&phase));
/// ```
#[derive(Debug, Clone)]
pub struct Phasor {
    phase: f32,
    phase_inc: f32,
    sample_rate: f32,
}

impl Phasor {
    /// Create a stopped phasor at phase 0.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 0.0,
            sample_rate,
        }
    }

    /// Set frequency in Hz (negative runs the ramp downward).
    #[inline]
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Set phase, wrapped into `[0, 1)`.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap(phase);
    }

    /// Current phase without advancing.
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Advance one sample and return the new phase.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.phase = wrap(self.phase + self.phase_inc);
        self.phase
    }
}

#[inline]
fn wrap(phase: f32) -> f32 {
    let wrapped = phase - floorf(phase);
    // floorf can round a tiny negative phase up to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_ramp_wraps() {
        let mut ramp = Phasor::new(100.0);
        ramp.set_frequency(10.0);
        let phases: Vec<f32> = (0..12).map(|_| ramp.advance()).collect();
        assert!((phases[0] - 0.1).abs() < 1e-5);
        assert!(phases[9] < 0.01 || phases[9] > 0.99);
    }

    #[test]
    fn falling_ramp_stays_in_range() {
        let mut ramp = Phasor::new(48000.0);
        ramp.set_frequency(-10.0);
        let mut prev = ramp.phase();
        let mut wraps = 0;
        // ten full periods plus change, stopping short of the eleventh wrap
        for _ in 0..47_000 {
            let phase = ramp.advance();
            assert!((0.0..1.0).contains(&phase));
            if phase > prev {
                wraps += 1;
            }
            prev = phase;
        }
        assert_eq!(wraps, 10);
    }

    #[test]
    fn set_phase_wraps_offsets() {
        let mut ramp = Phasor::new(48000.0);
        ramp.set_phase(1.5);
        assert!((ramp.phase() - 0.5).abs() < 1e-6);
        ramp.set_phase(-0.25);
        assert!((ramp.phase() - 0.75).abs() < 1e-6);
    }
}
