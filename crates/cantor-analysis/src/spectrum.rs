//! Spectral measurements on rendered signals

use crate::fft::{Fft, Window};

/// Magnitude spectrum of the first `fft_size` samples of `signal`.
pub fn magnitude_spectrum(signal: &[f32], fft_size: usize, window: Window) -> Vec<f32> {
    let fft = Fft::new(fft_size);

    let mut windowed: Vec<f32> = signal.iter().take(fft_size).copied().collect();
    windowed.resize(fft_size, 0.0);
    window.apply(&mut windowed);

    fft.forward(&windowed).iter().map(|c| c.norm()).collect()
}

/// Frequency of the strongest spectral peak, in Hz.
///
/// Uses a Hann window and parabolic interpolation around the peak bin, so
/// the estimate resolves well below one bin. DC is ignored. Returns 0.0 for
/// silence.
pub fn peak_frequency(signal: &[f32], sample_rate: f32, fft_size: usize) -> f32 {
    let spectrum = magnitude_spectrum(signal, fft_size, Window::Hann);
    let Some((peak, &peak_mag)) = spectrum
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
    else {
        return 0.0;
    };
    if peak_mag <= 1e-12 {
        return 0.0;
    }

    let bin_width = sample_rate / fft_size as f32;
    let offset = if peak + 1 < spectrum.len() {
        let (a, b, c) = (
            spectrum[peak - 1].max(1e-12).ln(),
            peak_mag.ln(),
            spectrum[peak + 1].max(1e-12).ln(),
        );
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 { 0.5 * (a - c) / denom } else { 0.0 }
    } else {
        0.0
    };

    (peak as f32 + offset) * bin_width
}

/// Spectral centroid of a magnitude spectrum, in Hz.
pub fn spectral_centroid(spectrum: &[f32], sample_rate: f32) -> f32 {
    if spectrum.len() < 2 {
        return 0.0;
    }
    let bin_width = sample_rate / ((spectrum.len() - 1) * 2) as f32;

    let (weighted, total) = spectrum
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(w, t), (i, &mag)| {
            (w + i as f32 * bin_width * mag, t + mag)
        });

    if total > 1e-10 { weighted / total } else { 0.0 }
}
