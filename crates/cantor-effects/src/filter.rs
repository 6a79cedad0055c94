//! The vocal chain's filters: the low-cut and the tone stack.
//!
//! Both recompute biquad coefficients every sample while a cutoff or gain is
//! gliding, and leave them alone once the smoother has settled.

use cantor_core::{
    Biquad, Effect, SmoothedParam, high_shelf_coefficients, highpass_coefficients,
    low_shelf_coefficients, peaking_eq_coefficients,
};

/// Low-cut cutoff when disengaged. The filter stays in circuit, detuned
/// below the vocal range, so its state is never discarded.
pub const LOW_CUT_OFF_HZ: f32 = 10.0;
/// Low-cut cutoff when engaged.
pub const LOW_CUT_ON_HZ: f32 = 100.0;
const LOW_CUT_Q: f32 = 0.7;

/// Low-shelf corner.
pub const LOW_SHELF_HZ: f32 = 320.0;
/// Mid peak center.
pub const MID_PEAK_HZ: f32 = 1000.0;
const MID_PEAK_Q: f32 = 1.0;
/// High-shelf corner.
pub const HIGH_SHELF_HZ: f32 = 3200.0;
/// Air shelf corner.
pub const AIR_SHELF_HZ: f32 = 12_000.0;
/// Air shelf gain when engaged.
pub const AIR_BOOST_DB: f32 = 5.0;

/// Toggleable high-pass (low-cut) filter.
///
/// | Setting | Cutoff | Q |
/// |---------|--------|---|
/// | off | 10 Hz | 0.7 |
/// | on | 100 Hz | 0.7 |
#[derive(Debug, Clone)]
pub struct HighPass {
    biquad: Biquad,
    cutoff: SmoothedParam,
    sample_rate: f32,
}

impl HighPass {
    /// Disengaged low-cut.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            biquad: Biquad::new(),
            cutoff: SmoothedParam::automation(LOW_CUT_OFF_HZ, sample_rate),
            sample_rate,
        };
        filter.update_coefficients();
        filter
    }

    /// Engage (100 Hz) or disengage (10 Hz) the low-cut.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.cutoff
            .set_target(if enabled { LOW_CUT_ON_HZ } else { LOW_CUT_OFF_HZ });
    }

    /// Target cutoff in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff.target()
    }

    /// Jump to the target. Only before the filter carries signal.
    pub fn settle(&mut self) {
        self.cutoff.snap_to_target();
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        self.biquad.set(highpass_coefficients(
            self.cutoff.get(),
            LOW_CUT_Q,
            self.sample_rate,
        ));
    }
}

impl Effect for HighPass {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if !self.cutoff.is_settled() {
            self.cutoff.advance();
            self.update_coefficients();
        }
        self.biquad.process(input)
    }

    fn reset(&mut self) {
        self.biquad.clear();
    }
}

/// One band of the tone stack: a biquad whose gain glides.
#[derive(Debug, Clone)]
struct Band {
    biquad: Biquad,
    gain_db: SmoothedParam,
    shape: BandShape,
}

#[derive(Debug, Clone, Copy)]
enum BandShape {
    LowShelf(f32),
    Peak(f32, f32),
    HighShelf(f32),
}

impl Band {
    fn new(shape: BandShape, sample_rate: f32) -> Self {
        let mut band = Self {
            biquad: Biquad::new(),
            gain_db: SmoothedParam::automation(0.0, sample_rate),
            shape,
        };
        band.update_coefficients(sample_rate);
        band
    }

    fn update_coefficients(&mut self, sample_rate: f32) {
        let gain = self.gain_db.get();
        let coefficients = match self.shape {
            BandShape::LowShelf(freq) => low_shelf_coefficients(freq, gain, sample_rate),
            BandShape::Peak(freq, q) => peaking_eq_coefficients(freq, q, gain, sample_rate),
            BandShape::HighShelf(freq) => high_shelf_coefficients(freq, gain, sample_rate),
        };
        self.biquad.set(coefficients);
    }

    #[inline]
    fn process(&mut self, input: f32, sample_rate: f32) -> f32 {
        if !self.gain_db.is_settled() {
            self.gain_db.advance();
            self.update_coefficients(sample_rate);
        }
        self.biquad.process(input)
    }
}

/// Three-band EQ plus the air shelf, in series.
///
/// ```text
/// in → low shelf 320 Hz → mid peak 1 kHz (Q 1) → high shelf 3.2 kHz → air shelf 12 kHz → out
/// ```
///
/// Band gains are in dB; the vocal controls span ±15 dB. The air shelf
/// toggles between 0 dB and +5 dB.
#[derive(Debug, Clone)]
pub struct ToneStack {
    low: Band,
    mid: Band,
    high: Band,
    air: Band,
    sample_rate: f32,
}

impl ToneStack {
    /// Flat tone stack.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            low: Band::new(BandShape::LowShelf(LOW_SHELF_HZ), sample_rate),
            mid: Band::new(BandShape::Peak(MID_PEAK_HZ, MID_PEAK_Q), sample_rate),
            high: Band::new(BandShape::HighShelf(HIGH_SHELF_HZ), sample_rate),
            air: Band::new(BandShape::HighShelf(AIR_SHELF_HZ), sample_rate),
            sample_rate,
        }
    }

    /// Target band gains in dB.
    pub fn set_gains_db(&mut self, low: f32, mid: f32, high: f32) {
        self.low.gain_db.set_target(low);
        self.mid.gain_db.set_target(mid);
        self.high.gain_db.set_target(high);
    }

    /// Engage the +5 dB air shelf.
    pub fn set_air(&mut self, enabled: bool) {
        self.air
            .gain_db
            .set_target(if enabled { AIR_BOOST_DB } else { 0.0 });
    }

    /// Target gains as `[low, mid, high, air]` in dB.
    pub fn gains_db(&self) -> [f32; 4] {
        [
            self.low.gain_db.target(),
            self.mid.gain_db.target(),
            self.high.gain_db.target(),
            self.air.gain_db.target(),
        ]
    }

    /// Jump to the targets. Only before the stack carries signal.
    pub fn settle(&mut self) {
        let sr = self.sample_rate;
        for band in [&mut self.low, &mut self.mid, &mut self.high, &mut self.air] {
            band.gain_db.snap_to_target();
            band.update_coefficients(sr);
        }
    }
}

impl Effect for ToneStack {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let sr = self.sample_rate;
        let x = self.low.process(input, sr);
        let x = self.mid.process(x, sr);
        let x = self.high.process(x, sr);
        self.air.process(x, sr)
    }

    fn reset(&mut self) {
        for band in [&mut self.low, &mut self.mid, &mut self.high, &mut self.air] {
            band.biquad.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;

    fn tone_gain_db<E: Effect>(effect: &mut E, freq: f32) -> f32 {
        let sr = 48000.0;
        let mut peak = 0.0f32;
        for i in 0..48000 {
            let y = effect.process((2.0 * PI * freq * i as f32 / sr).sin());
            if i > 24000 {
                peak = peak.max(y.abs());
            }
        }
        20.0 * peak.log10()
    }

    #[test]
    fn low_cut_toggles_cutoff() {
        let mut hp = HighPass::new(48000.0);
        assert_eq!(hp.cutoff_hz(), LOW_CUT_OFF_HZ);
        hp.set_enabled(true);
        hp.settle();
        assert!(tone_gain_db(&mut hp, 30.0) < -15.0);
        assert!(tone_gain_db(&mut hp, 2000.0).abs() < 0.5);
    }

    #[test]
    fn disengaged_low_cut_is_transparent_for_voice() {
        let mut hp = HighPass::new(48000.0);
        assert!(tone_gain_db(&mut hp, 150.0).abs() < 0.2);
    }

    #[test]
    fn flat_stack_is_unity() {
        let mut stack = ToneStack::new(48000.0);
        for freq in [100.0, 1000.0, 3000.0] {
            assert!(tone_gain_db(&mut stack, freq).abs() < 0.1);
        }
    }

    #[test]
    fn mid_boost_lands_at_center() {
        let mut stack = ToneStack::new(48000.0);
        stack.set_gains_db(0.0, 12.0, 0.0);
        stack.settle();
        assert!((tone_gain_db(&mut stack, 1000.0) - 12.0).abs() < 0.3);
    }

    #[test]
    fn gain_glides_rather_than_steps() {
        let mut stack = ToneStack::new(48000.0);
        stack.set_gains_db(15.0, 0.0, 0.0);
        // 1 ms after the change the shelf has barely moved
        let mut y = 0.0;
        for _ in 0..48 {
            y = stack.process(1.0);
        }
        assert!(y < 1.1, "DC gain jumped to {y}");
    }

    #[test]
    fn air_toggle() {
        let mut stack = ToneStack::new(48000.0);
        stack.set_air(true);
        assert_eq!(stack.gains_db()[3], AIR_BOOST_DB);
        stack.set_air(false);
        assert_eq!(stack.gains_db()[3], 0.0);
    }
}
