//! Input gain stage.

use cantor_core::{Effect, SmoothedParam, db_to_linear};

/// Smoothed gain in dB, applied as `10^(dB/20)`.
///
/// The smoother runs in the linear domain, so a large dB jump glides like a
/// fader rather than sweeping through dB steps.
///
/// # Example
///
/// ```rust
/// use cantor_core::Effect;
/// use cantor_effects::GainStage;
///
/// let mut stage = GainStage::new(48000.0);
/// stage.set_gain_db(6.0);
/// stage.settle();
/// assert!((stage.process(0.5) - 0.9976).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct GainStage {
    gain: SmoothedParam,
}

impl GainStage {
    /// Unity gain.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            gain: SmoothedParam::automation(1.0, sample_rate),
        }
    }

    /// Target gain in dB.
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain.set_target(db_to_linear(gain_db));
    }

    /// Target linear gain.
    pub fn gain(&self) -> f32 {
        self.gain.target()
    }

    /// Jump to the target. Only before the stage carries signal.
    pub fn settle(&mut self) {
        self.gain.snap_to_target();
    }
}

impl Effect for GainStage {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * self.gain.advance()
    }

    fn reset(&mut self) {}
}
