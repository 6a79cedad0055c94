//! Real-time spectrum analyser with browser-analyser semantics.
//!
//! The analyser keeps the most recent `fft_size` samples pushed into it and
//! answers four reads:
//!
//! | Read | Scale |
//! |------|-------|
//! | [`float_frequency_data`](Analyser::float_frequency_data) | dBFS per bin |
//! | [`byte_frequency_data`](Analyser::byte_frequency_data) | 0–255 over `[min_db, max_db]` |
//! | [`float_time_domain_data`](Analyser::float_time_domain_data) | raw samples |
//! | [`byte_time_domain_data`](Analyser::byte_time_domain_data) | `128 · (1 + x)`, 0–255 |
//!
//! Frequency reads window the block with a Blackman window, take `|X[k]| / N`
//! and smooth each bin over successive reads:
//! `S[k] = τ · S_prev[k] + (1 − τ) · |X[k]|`, with `τ = 0.8` by default.

use crate::fft::{Fft, Window};

/// Default FFT size.
pub const DEFAULT_FFT_SIZE: usize = 2048;
/// Default smoothing time constant.
pub const DEFAULT_SMOOTHING: f32 = 0.8;
/// Default floor of the byte scale.
pub const DEFAULT_MIN_DB: f32 = -100.0;
/// Default ceiling of the byte scale.
pub const DEFAULT_MAX_DB: f32 = -30.0;

/// Windowed FFT analyser over a sliding block of samples.
///
/// # Example
///
/// ```rust
/// use cantor_analysis::Analyser;
///
/// let mut analyser = Analyser::new(2048);
/// for i in 0..4096 {
///     analyser.push((i as f32 * 0.1).sin());
/// }
/// let mut bytes = vec![0u8; analyser.frequency_bin_count()];
/// analyser.byte_frequency_data(&mut bytes);
/// assert!(bytes.iter().any(|&b| b > 0));
/// ```
pub struct Analyser {
    fft: Fft,
    window: Vec<f32>,
    ring: Vec<f32>,
    write_pos: usize,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_db: f32,
    max_db: f32,
    scratch: Vec<f32>,
}

impl Analyser {
    /// Analyser over `fft_size` samples (a power of two).
    pub fn new(fft_size: usize) -> Self {
        Self {
            fft: Fft::new(fft_size),
            window: Window::Blackman.coefficients(fft_size),
            ring: vec![0.0; fft_size],
            write_pos: 0,
            smoothed: vec![0.0; fft_size / 2],
            smoothing: DEFAULT_SMOOTHING,
            min_db: DEFAULT_MIN_DB,
            max_db: DEFAULT_MAX_DB,
            scratch: vec![0.0; fft_size],
        }
    }

    /// Smoothing time constant in `[0, 1)`.
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.999);
    }

    /// Byte-scale range in dB.
    pub fn set_decibel_range(&mut self, min_db: f32, max_db: f32) {
        self.min_db = min_db;
        self.max_db = max_db.max(min_db + 1.0);
    }

    /// FFT size.
    pub fn fft_size(&self) -> usize {
        self.ring.len()
    }

    /// Number of frequency bins, half the FFT size.
    pub fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Append one sample.
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.ring[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.ring.len();
    }

    /// Append a block of samples.
    pub fn push_slice(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    /// Forget all history, including smoothing.
    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
        self.smoothed.fill(0.0);
    }

    /// Per-bin level in dB. Silent bins read as negative infinity.
    pub fn float_frequency_data(&mut self, out: &mut [f32]) {
        self.analyse();
        for (o, &m) in out.iter_mut().zip(&self.smoothed) {
            *o = if m > 0.0 {
                20.0 * m.log10()
            } else {
                f32::NEG_INFINITY
            };
        }
    }

    /// Per-bin level scaled to 0–255 across the decibel range.
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyse();
        let scale = 255.0 / (self.max_db - self.min_db);
        for (o, &m) in out.iter_mut().zip(&self.smoothed) {
            *o = if m > 0.0 {
                let db = 20.0 * m.log10();
                (scale * (db - self.min_db)).floor().clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }

    /// Most recent block, oldest first.
    pub fn float_time_domain_data(&self, out: &mut [f32]) {
        let len = self.ring.len();
        for (i, o) in out.iter_mut().take(len).enumerate() {
            *o = self.ring[(self.write_pos + i) % len];
        }
    }

    /// Most recent block as bytes centered on 128.
    pub fn byte_time_domain_data(&self, out: &mut [u8]) {
        let len = self.ring.len();
        for (i, o) in out.iter_mut().take(len).enumerate() {
            let x = self.ring[(self.write_pos + i) % len];
            *o = (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8;
        }
    }

    fn analyse(&mut self) {
        let len = self.ring.len();
        for (i, s) in self.scratch.iter_mut().enumerate() {
            *s = self.ring[(self.write_pos + i) % len] * self.window[i];
        }

        let spectrum = self.fft.forward(&self.scratch);
        let norm = 1.0 / len as f32;
        let tau = self.smoothing;
        for (s, c) in self.smoothed.iter_mut().zip(&spectrum) {
            let mag = c.norm() * norm;
            let next = tau * *s + (1.0 - tau) * mag;
            *s = if next.is_finite() { next } else { 0.0 };
        }
    }
}

impl Default for Analyser {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}
