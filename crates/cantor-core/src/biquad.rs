//! Biquad (bi-quadratic) filter structure.
//!
//! A second-order IIR section plus the RBJ Audio EQ Cookbook coefficient
//! functions used by the vocal chain: high-pass (low-cut), peaking, low-shelf
//! and high-shelf. Shelves use slope `S = 1`, matching the shelf shape of
//! browser audio graphs.

use core::f32::consts::{PI, SQRT_2};
use libm::{cosf, powf, sinf, sqrtf};

/// Unnormalized `(b0, b1, b2, a0, a1, a2)` coefficients.
pub type BiquadCoefficients = (f32, f32, f32, f32, f32, f32);

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// Direct Form I keeps its state in signal units, so coefficients can be
/// swapped every sample while a cutoff or gain glides without the internal
/// state blowing up.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    /// Input history: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output history: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Sets the coefficients from a [`BiquadCoefficients`] tuple.
    #[inline]
    pub fn set(&mut self, coefficients: BiquadCoefficients) {
        let (b0, b1, b2, a0, a1, a2) = coefficients;
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Processes a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state, keeping the coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response in dB at `frequency`, from the current coefficients.
    pub fn magnitude_db(&self, frequency: f32, sample_rate: f32) -> f32 {
        let omega = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(omega), sinf(omega));
        let (c2, s2) = (cosf(2.0 * omega), sinf(2.0 * omega));

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = den_re * den_re + den_im * den_im;
        10.0 * libm::log10f(num.max(1e-30) / den.max(1e-30))
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// High-pass coefficients (RBJ cookbook).
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (0.707 for Butterworth)
/// * `sample_rate` - Sample rate in Hz
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Peaking EQ coefficients (RBJ cookbook).
///
/// Boosts or cuts `gain_db` around `frequency` with bandwidth `frequency / q`.
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Low-shelf coefficients (RBJ cookbook, slope 1).
///
/// Frequencies well below `frequency` are scaled by `gain_db`; the response
/// at the corner sits at half the shelf gain.
pub fn low_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / 2.0 * SQRT_2;
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// High-shelf coefficients (RBJ cookbook, slope 1).
pub fn high_shelf_coefficients(frequency: f32, gain_db: f32, sample_rate: f32) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / 2.0 * SQRT_2;
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn filter(coefficients: BiquadCoefficients) -> Biquad {
        let mut biquad = Biquad::new();
        biquad.set(coefficients);
        biquad
    }

    #[test]
    fn test_biquad_passthrough() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-4);
        }
    }

    #[test]
    fn test_biquad_clear() {
        let mut biquad = filter(highpass_coefficients(100.0, 0.7, SR));
        for _ in 0..10 {
            biquad.process(1.0);
        }
        biquad.clear();
        assert_eq!(biquad.x1, 0.0);
        assert_eq!(biquad.y2, 0.0);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut biquad = filter(highpass_coefficients(100.0, 0.7, SR));
        let mut output = 1.0;
        for _ in 0..48000 {
            output = biquad.process(1.0);
        }
        assert!(output.abs() < 1e-3, "DC leaked: {output}");
    }

    #[test]
    fn test_highpass_response() {
        let biquad = filter(highpass_coefficients(100.0, 0.7, SR));
        assert!(biquad.magnitude_db(1000.0, SR).abs() < 0.5);
        assert!(biquad.magnitude_db(25.0, SR) < -20.0);
    }

    #[test]
    fn test_peaking_unity_at_zero_gain() {
        let biquad = filter(peaking_eq_coefficients(1000.0, 1.0, 0.0, SR));
        for freq in [50.0, 1000.0, 8000.0] {
            assert!(biquad.magnitude_db(freq, SR).abs() < 1e-3);
        }
    }

    #[test]
    fn test_peaking_gain_at_center() {
        let biquad = filter(peaking_eq_coefficients(1000.0, 1.0, 9.0, SR));
        assert!((biquad.magnitude_db(1000.0, SR) - 9.0).abs() < 0.05);
        assert!(biquad.magnitude_db(20.0, SR).abs() < 0.1);
    }

    #[test]
    fn test_low_shelf_plateau_and_corner() {
        let biquad = filter(low_shelf_coefficients(320.0, 12.0, SR));
        assert!((biquad.magnitude_db(20.0, SR) - 12.0).abs() < 0.3);
        assert!((biquad.magnitude_db(320.0, SR) - 6.0).abs() < 0.3);
        assert!(biquad.magnitude_db(10_000.0, SR).abs() < 0.2);
    }

    #[test]
    fn test_high_shelf_plateau_and_corner() {
        let biquad = filter(high_shelf_coefficients(3200.0, -10.0, SR));
        assert!((biquad.magnitude_db(20_000.0, SR) + 10.0).abs() < 0.5);
        assert!((biquad.magnitude_db(3200.0, SR) + 5.0).abs() < 0.3);
        assert!(biquad.magnitude_db(100.0, SR).abs() < 0.1);
    }

    #[test]
    fn test_air_shelf_at_quarter_sample_rate() {
        let biquad = filter(high_shelf_coefficients(12_000.0, 5.0, SR));
        assert!((biquad.magnitude_db(12_000.0, SR) - 2.5).abs() < 0.3);
        assert!(biquad.magnitude_db(500.0, SR).abs() < 0.1);
    }
}
