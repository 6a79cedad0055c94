//! Feed-forward vocal compressor.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Envelope Follower (3 ms / 250 ms) → Gain Computer → × Input
//! ```
//!
//! # Parameters
//!
//! | Parameter | Range | Runtime |
//! |-----------|-------|---------|
//! | Threshold | -60 to 0 dB | smoothed |
//! | Ratio | 1:1 to 20:1 | smoothed |
//! | Attack | 3 ms | fixed |
//! | Release | 250 ms | fixed |
//! | Knee | 30 dB | fixed |
//!
//! The wide knee matches the default curve of browser dynamics compressors,
//! which vocal presets are tuned against. There is no makeup gain.

use cantor_core::{Effect, EnvelopeFollower, SmoothedParam, db_to_linear, linear_to_db};

/// Attack time in milliseconds.
pub const ATTACK_MS: f32 = 3.0;
/// Release time in milliseconds.
pub const RELEASE_MS: f32 = 250.0;
/// Soft-knee width in dB.
pub const KNEE_DB: f32 = 30.0;

/// Static curve: gain change in dB for a detector level in dB.
///
/// Quadratic interpolation across the knee (Giannoulis, Massberg & Reiss).
#[inline]
fn gain_computer_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    let overshoot = level_db - threshold_db;
    let slope = 1.0 / ratio - 1.0;
    let half_knee = KNEE_DB / 2.0;

    if overshoot <= -half_knee {
        0.0
    } else if overshoot >= half_knee {
        slope * overshoot
    } else {
        let x = overshoot + half_knee;
        slope * x * x / (2.0 * KNEE_DB)
    }
}

/// Dynamics compressor with threshold and ratio as the only live controls.
///
/// # Example
///
/// ```rust
/// use cantor_core::Effect;
/// use cantor_effects::Compressor;
///
/// let mut comp = Compressor::new(48000.0);
/// comp.set_threshold_db(-24.0);
/// comp.set_ratio(4.0);
/// let out = comp.process(0.5);
/// assert!(out.abs() <= 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    envelope: EnvelopeFollower,
    threshold_db: SmoothedParam,
    ratio: SmoothedParam,
    gain_reduction_db: f32,
}

impl Compressor {
    /// Threshold -24 dB, ratio 4:1.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::with_times(sample_rate, ATTACK_MS, RELEASE_MS),
            threshold_db: SmoothedParam::automation(-24.0, sample_rate),
            ratio: SmoothedParam::automation(4.0, sample_rate),
            gain_reduction_db: 0.0,
        }
    }

    /// Target threshold in dB.
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db.set_target(threshold_db);
    }

    /// Target ratio; values below 1 are treated as 1 (no compression).
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio.set_target(ratio.max(1.0));
    }

    /// Target `(threshold_db, ratio)`.
    pub fn targets(&self) -> (f32, f32) {
        (self.threshold_db.target(), self.ratio.target())
    }

    /// Most recent gain change in dB (zero or negative).
    pub fn gain_reduction_db(&self) -> f32 {
        self.gain_reduction_db
    }

    /// Jump to the targets. Only before the compressor carries signal.
    pub fn settle(&mut self) {
        self.threshold_db.snap_to_target();
        self.ratio.snap_to_target();
    }
}

impl Effect for Compressor {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let threshold = self.threshold_db.advance();
        let ratio = self.ratio.advance();
        let level = self.envelope.process(input);

        self.gain_reduction_db = gain_computer_db(linear_to_db(level), threshold, ratio);
        input * db_to_linear(self.gain_reduction_db)
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.gain_reduction_db = 0.0;
    }
}
